//! Client core for community-fit: groups own a chat topic, history comes in
//! over REST, live traffic over a single websocket subscription scoped to the
//! active group. No GUI here; consumers drive the coordinator and drain its
//! event channel.

pub mod client;
pub mod common;
