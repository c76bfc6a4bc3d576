mod processor;

pub use processor::BatchRunner;
