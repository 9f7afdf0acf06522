//! WebSocket Real-Time Streaming
//!
//! Pushes scene patches and feed events to chart clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! - `scene` - One `scene_patch` per successful refresh
//! - `feed` - `refresh_failed` and `refresh_skipped`
//! - `system` - Server notices
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['scene']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'scene_patch') console.log(msg.added, 'new words');
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError, VALID_TOPICS};
pub use messages::{
    ClientMessage, ServerMessage, WsEvent, TOPIC_FEED, TOPIC_SCENE, TOPIC_SYSTEM,
};
