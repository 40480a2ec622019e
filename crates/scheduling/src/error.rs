use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Invalid month: {month}/{year} is not a valid calendar month")]
    InvalidMonth { year: i32, month: u32 },

    #[error(
        "Invalid minister bounds for {date} {time}: maximum {maximum} is less than minimum {minimum}"
    )]
    InvalidSlotBounds {
        date: String,
        time: String,
        minimum: u32,
        maximum: u32,
    },

    #[error("Unparseable mass time in configuration: {0}")]
    InvalidTime(String),

    #[error("Store error: {0}")]
    Store(String),
}
