mod writer;

pub use writer::{MessageWriter, StdoutWriter};

#[cfg(test)]
pub use writer::MockWriter;
