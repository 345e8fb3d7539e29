//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements     | Connects to                    |
//! |-----------------|----------------|--------------------------------|
//! | `memory_flash`  | FlashPort      | RAM image of the NOR flash     |
//! | `config_store`  | ConfigPort     | Config blob region on flash    |
//! | `log_sink`      | EventSink      | `log` facade                   |
//! |                 | NotifySink     |                                |
//! | `handle_switch` | —              | Reed switch via embedded-hal   |

pub mod config_store;
pub mod handle_switch;
pub mod log_sink;
pub mod memory_flash;
