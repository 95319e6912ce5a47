//! Single threaded WebSocket and raw TCP stream reassembly server.
//!
//! A [`Server`] accepts TCP connections into a fixed-size table and services all of them from
//! one task. The first bytes of every connection decide how it is treated:
//! - A connection starting with `GET ` is a WebSocket upgrade. The handshake is answered and
//!   every following byte is decoded as client to server frames, however the stream happens
//!   to be split into reads.
//! - Anything else is a raw connection. Its bytes are passed on untouched.
//!
//! Payloads, record boundaries and the final statistics of each connection are delivered to a
//! [`Sink`].
//!
//! # Server
//!
//! ```no_run
//! # async fn server() -> std::io::Result<()> {
//! use wsmux::{LogSink, Server, options::ServerOptions};
//!
//! let mut server = Server::bind("127.0.0.1:8331", ServerOptions::default(), LogSink).await?;
//!
//! server.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Client
//!
//! ```no_run
//! # async fn client() -> Result<(), wsmux::error::ClientError> {
//! use rand::{SeedableRng, rngs::StdRng};
//! use tokio::net::TcpStream;
//! use wsmux::{Message, client::Client, options::ConnectOptions};
//!
//! let stream = TcpStream::connect("127.0.0.1:8331").await?;
//!
//! let mut client = Client::connect(
//!     ConnectOptions::default().with_host("127.0.0.1:8331"),
//!     stream,
//!     StdRng::from_os_rng(),
//! )
//! .await?;
//!
//! client.send(Message::Text("first record\n")).await?;
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod buffer;
pub use buffer::{PayloadBuffer, RecvBuffer};

pub mod client;

mod codec;
pub use codec::{FramesCodec, Masking, encoded_len};

mod connection;
pub use connection::{Connection, ConnectionId, ConnectionStats, Mode};

pub mod error;

mod frame;
pub use frame::{Frame, Header};

pub mod handshake;

pub mod http;

mod mask;

mod message;
pub use message::Message;

#[doc(hidden)]
pub mod mock;

mod opcode;
pub use opcode::OpCode;

pub mod options;

mod reassembler;
pub use reassembler::{Reassembled, Reassembler};

mod record;
pub use record::Records;

mod server;
pub use server::{Server, Tick};

mod sink;
pub use sink::{LogSink, Sink};

pub mod transport;
