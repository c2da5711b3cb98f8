use std::hint::black_box;
use std::time::{Duration, Instant};

use chromic::{Command, EffectKind, Session};
use criterion::{criterion_group, criterion_main, Criterion};

fn parse_commands(c: &mut Criterion) {
    let lines = [
        "add Tilt Shift Blur",
        "update 3f0c9a52-5d0e-4d7e-9c1a-07b1c8a4f2d1 cursorAt [120.5, 88]",
        "switch 3 7",
        "undo",
    ];
    c.bench_function("parse_commands", |b| {
        b.iter(|| {
            for line in lines {
                black_box(line.parse::<Command>().ok());
            }
        })
    });
}

/// A drag gesture: one add followed by a burst of updates inside the debounce window.
fn drag_gesture(c: &mut Criterion) {
    c.bench_function("drag_gesture_100_updates", |b| {
        b.iter(|| {
            let start = Instant::now();
            let mut session = Session::default();
            for kind in EffectKind::CATALOG {
                session
                    .run_at(&format!("add {}", kind.display_name()), start)
                    .ok();
            }
            let id = session.stack().elements()[0].id.clone();
            for step in 0..100u64 {
                let line = format!("update {id} hue {}", step as f64 / 100.0);
                session
                    .run_at(&line, start + Duration::from_millis(step * 5))
                    .ok();
            }
            session.flush();
            black_box(session.history().len())
        })
    });
}

fn undo_redo(c: &mut Criterion) {
    let start = Instant::now();
    let mut session = Session::default();
    for step in 0..200u32 {
        session
            .run_at("add Noise", start + Duration::from_millis(400) * step)
            .ok();
    }
    session.flush();

    c.bench_function("undo_redo_200_entries", |b| {
        b.iter(|| {
            session.run("undo").ok();
            session.run("redo").ok();
            black_box(session.stack().len())
        })
    });
}

criterion_group!(benches, parse_commands, drag_gesture, undo_redo);
criterion_main!(benches);
