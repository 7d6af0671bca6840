//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `log_sink`     | EventSink          | `log` facade                 |
//! | `time`         | Clock              | system clock                 |
//! | `mqtt`         | CommandTransport   | MQTT broker (rumqttc)        |
//! | `weather_http` | WeatherFeed        | HTTP weather endpoint        |
//! | `http_server`  | —                  | TCP listener → `api`         |
//! | `io_task`      | SchedulerDelegate  | telemetry channel, scheduler |

pub mod http_server;
pub mod io_task;
pub mod log_sink;
#[cfg(feature = "gateway")]
pub mod mqtt;
pub mod time;
pub mod weather_http;
