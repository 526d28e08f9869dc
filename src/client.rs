//! Controller-side client for the loader host.
//!
//! A [`Client`] multiplexes concurrent requests over one connection using
//! correlation keys: a background read task matches each incoming frame to
//! the request that carries its key, so responses may arrive in any order.
//! Key allocation is wraparound-safe; a key is never handed out again while
//! the request holding it is still in flight.

use std::collections::HashMap ;
use std::net::SocketAddr ;
use std::sync::atomic::{ AtomicU16, Ordering };
use std::sync::Arc ;
use std::time::Duration ;

use bytes::Bytes ;
use futures::stream::{ SplitSink, SplitStream };
use futures::{ SinkExt, StreamExt };
use parking_lot::Mutex ;
use thiserror::Error ;
use tokio::net::TcpStream ;
use tokio::sync::{ mpsc, oneshot };
use tokio_util::codec::{ Framed, LengthDelimitedCodec };
use tokio_util::sync::CancellationToken ;

use crate::protocol::{
	self, Acknowledgement, GetLoadedMods, GetLoadedModsResponse, Message, MessageKey,
	ModStateType, ProtocolError, ServerModInfo, SetModState,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs( 10 );

/// Errors from talking to a loader host.
#[derive( Debug, Error )]
pub enum ClientError {
	#[error( "client i/o error: {0}" )]
	Io( #[from] std::io::Error ),
	#[error( transparent )]
	Protocol( #[from] ProtocolError ),
	/// The host did not answer within the per-request timeout.
	#[error( "request {key} timed out" )]
	Timeout { key: MessageKey },
	/// The connection closed while requests were outstanding.
	#[error( "connection to the loader host closed" )]
	ConnectionClosed,
	/// All 65536 correlation keys are held by in-flight requests.
	#[error( "no correlation key available, too many requests in flight" )]
	KeysExhausted,
	/// The host executed the command and reported a failure.
	#[error( "host rejected the command: {0}" )]
	Host( String ),
}

type PendingMap = Arc<Mutex<HashMap<MessageKey, oneshot::Sender<Bytes>>>>;
type Writer = SplitSink<Framed<TcpStream, LengthDelimitedCodec>, Bytes>;
type Reader = SplitStream<Framed<TcpStream, LengthDelimitedCodec>>;

/// A connection to a loader host, usable concurrently from many tasks.
pub struct Client {
	to_writer: mpsc::UnboundedSender<Bytes>,
	pending: PendingMap,
	next_key: AtomicU16,
	timeout: Duration,
	shutdown: CancellationToken,
}

impl Client {

	/// Connects to a loader host with the default per-request timeout.
	pub async fn connect( addr: SocketAddr ) -> Result<Self, ClientError> {
		Self::connect_with_timeout( addr, DEFAULT_REQUEST_TIMEOUT ).await
	}

	/// Connects to a loader host with an explicit per-request timeout.
	pub async fn connect_with_timeout( addr: SocketAddr, timeout: Duration ) -> Result<Self, ClientError> {
		let stream = TcpStream::connect( addr ).await?;
		let ( writer, reader ) = Framed::new( stream, LengthDelimitedCodec::new() ).split();

		let pending: PendingMap = Arc::new( Mutex::new( HashMap::new() ));
		let ( to_writer, from_requests ) = mpsc::unbounded_channel();
		let shutdown = CancellationToken::new();

		tokio::spawn( write_loop( writer, from_requests, shutdown.child_token() ));
		tokio::spawn( read_loop( reader, Arc::clone( &pending ), shutdown.child_token() ));

		Ok( Self {
			to_writer,
			pending,
			next_key: AtomicU16::new( 0 ),
			timeout,
			shutdown,
		})
	}

	/// The host's current loaded mod list, in load order.
	pub async fn get_loaded_mods( &self ) -> Result<Vec<ServerModInfo>, ClientError> {
		let response: GetLoadedModsResponse = self.send_request( &GetLoadedMods ).await?;
		Ok( response.mods )
	}

	/// Asks the host to apply a state transition to a mod.
	pub async fn set_mod_state( &self, mod_id: impl Into<String>, state: ModStateType ) -> Result<(), ClientError> {
		let request = SetModState { mod_id: mod_id.into(), state };
		let ack: Acknowledgement = self.send_request( &request ).await?;
		match ack.message {
			Some( text ) => Err( ClientError::Host( text )),
			None => Ok(()),
		}
	}

	/// Asks the host to load a mod and its dependencies.
	pub async fn load_mod( &self, mod_id: impl Into<String> ) -> Result<(), ClientError> {
		self.set_mod_state( mod_id, ModStateType::Load ).await
	}

	/// Asks the host to suspend a mod.
	pub async fn suspend_mod( &self, mod_id: impl Into<String> ) -> Result<(), ClientError> {
		self.set_mod_state( mod_id, ModStateType::Suspend ).await
	}

	/// Asks the host to resume a suspended mod.
	pub async fn resume_mod( &self, mod_id: impl Into<String> ) -> Result<(), ClientError> {
		self.set_mod_state( mod_id, ModStateType::Resume ).await
	}

	/// Asks the host to unload a mod.
	pub async fn unload_mod( &self, mod_id: impl Into<String> ) -> Result<(), ClientError> {
		self.set_mod_state( mod_id, ModStateType::Unload ).await
	}

	/// Sends one request and awaits the response carrying the same key.
	pub async fn send_request<M: Message, R: Message>( &self, request: &M ) -> Result<R, ClientError> {

		let ( key, receiver ) = {
			let mut pending = self.pending.lock();
			let key = self.allocate_key( &pending )?;
			let ( sender, receiver ) = oneshot::channel();
			pending.insert( key, sender );
			( key, receiver )
		};

		let body = protocol::encode( request, key )?;
		if self.to_writer.send( Bytes::from( body )).is_err() {
			self.pending.lock().remove( &key );
			return Err( ClientError::ConnectionClosed );
		}

		let raw = match tokio::time::timeout( self.timeout, receiver ).await {
			Ok( Ok( raw )) => raw,
			// The read task drops pending senders when the connection dies.
			Ok( Err( _closed )) => return Err( ClientError::ConnectionClosed ),
			Err( _elapsed ) => {
				self.pending.lock().remove( &key );
				return Err( ClientError::Timeout { key });
			}
		};

		let ( response, _key ) = protocol::decode::<R>( &raw )?;
		Ok( response )

	}

	/// Picks the next key not held by an in-flight request.
	///
	/// The counter wraps; a candidate still in the pending map is skipped, so
	/// a key is reused only after its previous request completed.
	fn allocate_key( &self, pending: &HashMap<MessageKey, oneshot::Sender<Bytes>> ) -> Result<MessageKey, ClientError> {
		for _ in 0..=usize::from( u16::MAX ) {
			let key = MessageKey( self.next_key.fetch_add( 1, Ordering::Relaxed ));
			if !pending.contains_key( &key ) {
				return Ok( key );
			}
		}
		Err( ClientError::KeysExhausted )
	}

}

impl Drop for Client {
	fn drop( &mut self ) {
		self.shutdown.cancel();
	}
}

impl std::fmt::Debug for Client {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Client" )
			.field( "in_flight", &self.pending.lock().len() )
			.finish()
	}
}

async fn write_loop(
	mut writer: Writer,
	mut from_requests: mpsc::UnboundedReceiver<Bytes>,
	shutdown: CancellationToken,
) {
	loop {
		tokio::select! {
			() = shutdown.cancelled() => break,
			body = from_requests.recv() => match body {
				Some( body ) => {
					if let Err( error ) = writer.send( body ).await {
						tracing::warn!( %error, "client write failed" );
						break ;
					}
				}
				None => break,
			}
		}
	}
}

async fn read_loop( mut reader: Reader, pending: PendingMap, shutdown: CancellationToken ) {
	loop {
		tokio::select! {
			() = shutdown.cancelled() => break,
			frame = reader.next() => {
				let raw = match frame {
					Some( Ok( raw )) => raw.freeze(),
					Some( Err( error )) => {
						tracing::warn!( %error, "client read failed" );
						break ;
					}
					None => break,
				};
				let key = match protocol::peek( &raw ) {
					Ok(( _tag, key )) => key,
					Err( error ) => {
						tracing::warn!( %error, "dropping malformed response" );
						continue ;
					}
				};
				match pending.lock().remove( &key ) {
					// The waiter may have timed out already; its receiver is gone.
					Some( sender ) => drop( sender.send( raw )),
					None => tracing::debug!( %key, "response with no matching request" ),
				}
			}
		}
	}

	// Waking every outstanding waiter: dropped senders read as closed.
	pending.lock().clear();
}
