//! Answer composer domain

mod compose;
mod phrases;
mod template;

pub use compose::{AnswerComposer, ComposedAnswer, CompositionInput};
pub use phrases::{phrases, states_only, Phrases};
pub use template::{render_template, ResponseTemplate, TemplateError, TemplateVariable};
