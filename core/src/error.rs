use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MelodyError {
    #[error("Invalid RTTTL string: expected 3 ':'-separated sections, found {sections}")]
    InvalidFormat { sections: usize },

    #[error("Melody buffer of {length} bytes is too small to fit an AM32 startup melody (minimum {minimum})")]
    BufferTooSmall { length: usize, minimum: usize },
}

pub type Result<T> = std::result::Result<T, MelodyError>;
