//! Remote services the tools talk to

pub mod canvas;
pub mod gradescope;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use canvas::{CanvasApi, CanvasClient};
pub use gradescope::{GradescopeApi, GradescopeClient};

/// Service an assignment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Canvas,
    Gradescope,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Canvas => "Canvas",
            Platform::Gradescope => "Gradescope",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
