mod pushback;

pub use pushback::PushbackReader;
