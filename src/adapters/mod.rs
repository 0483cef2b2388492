//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `gpiomem`      | GpioPort           | `/dev/gpiomem` register block |
//! | `sim_gpio`     | GpioPort           | in-memory pin bank            |
//! | `frame_clock`  | FrameTimer         | timerfd, `clock_nanosleep`    |
//! | `hardware`     | GpioPort           | one of the GPIO adapters      |
//! |                | FrameTimer         | the frame clock               |
//! | `log_sink`     | EventSink          | `log` facade                  |
//! | `unix_socket`  | ControlTransport   | Unix stream socket            |
//!
//! `realtime` and `signals` are process-lifecycle helpers used by `main`.

pub mod frame_clock;
pub mod gpiomem;
pub mod hardware;
pub mod log_sink;
pub mod realtime;
pub mod signals;
pub mod sim_gpio;
pub mod unix_socket;
