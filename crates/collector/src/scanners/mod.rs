//! Background housekeeping threads, one module per scan.

pub mod alarm_silencer;
pub mod statistical_alarmer;
pub mod time_to_forget;
pub mod udp_timeout;
