//! Applies a modifier stack to an image without a window.
//!
//! ```text
//! cargo run --example apply_stack -- input.png output.png < commands.txt
//! ```
//!
//! Each stdin line is one command (`add Sepia`, `update <id> amount 0.8`, ...).
//! `list` prints the stack with element ids.
use std::io::BufRead;

use chromic::{render_stack, ContextOptions, RenderContext, Session};
use futures::executor::block_on;

pub fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: apply_stack <input image> <output png>");
        std::process::exit(2);
    };

    let image = image::open(&input)
        .expect("To open the input image")
        .to_rgba8();

    let mut session = Session::default();
    for line in std::io::stdin().lock().lines() {
        let line = line.expect("To read stdin");
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "list" {
            for (index, element) in session.stack().iter().enumerate() {
                println!("{index}: {} {} {:?}", element.id, element.name, element.config);
            }
            continue;
        }
        if let Err(error) = session.run(line) {
            eprintln!("{line}: {error}");
        }
    }
    session.flush();

    let mut context = block_on(RenderContext::new_headless(
        image.dimensions(),
        ContextOptions::default(),
    ))
    .expect("To create a headless render context");
    let source = context
        .create_texture_from_image(&image)
        .expect("To upload the input image");

    render_stack(&mut context, &source, session.stack()).expect("To render the stack");
    context
        .to_image()
        .expect("To read back the result")
        .save(&output)
        .expect("To write the output image");
    println!(
        "wrote {output} with {} modifiers ({} history entries)",
        session.stack().len(),
        session.history().len()
    );
}
