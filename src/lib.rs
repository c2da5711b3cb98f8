//! GPU image effect chains driven by an undoable modifier stack.
//!
//! A [`Session`] owns the [`ModifierStack`] and interprets textual commands
//! against it. A [`RenderContext`] renders that stack over a source image with
//! the passes of [`effects`].

pub use wgpu;

mod catalog;
mod command;
mod context;
pub mod effects;
mod error;
mod history;
mod math;
mod modifier;
mod session;
pub mod shader;
mod texture;

pub use catalog::EffectKind;
pub use command::{Command, CommandError};
pub use context::{ContextOptions, RenderContext, TextureRole};
pub use effects::{apply_modifier, apply_stack, plan_for, render_stack, EffectError, EffectPlan};
pub use error::RenderError;
pub use history::{DebouncePolicy, Debouncer, UndoRedoManager};
pub use math::{square_to_quad, Mat3};
pub use modifier::{Config, ConfigValue, Corners, ModifierElement, ModifierId, ModifierStack};
pub use session::{Session, SessionConfig};
pub use texture::{PixelFormat, SampleType, Texture, TextureSpec};
