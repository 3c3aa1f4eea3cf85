//! Core widget components
//!
//! This module contains the controller that ties the transcript, the answer
//! service and the speech capabilities together.

mod view;
mod widget;

pub use view::{Status, View};
pub use widget::{ChatWidget, UiEvent};
