mod docx;
pub use docx::*;
