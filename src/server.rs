//! Framed-TCP RPC host exposing the loader to external controllers.
//!
//! Transport frames are length-delimited; each frame body is routed by its
//! type tag through an owned [`Dispatcher`], never a global registry. One
//! tokio task serves each connection; each received frame is dispatched on
//! the blocking pool because handlers may block on loader locks and on mods'
//! own hooks. Retry and reconnect logic belongs to the peer, not this host.

use std::collections::HashMap ;
use std::net::SocketAddr ;
use std::sync::Arc ;

use bytes::Bytes ;
use futures::{ SinkExt, StreamExt };
use parking_lot::RwLock ;
use thiserror::Error ;
use tokio::net::{ TcpListener, TcpStream };
use tokio_util::codec::{ Framed, LengthDelimitedCodec };
use tokio_util::sync::CancellationToken ;

use crate::loader::Loader ;
use crate::protocol::{
	self, Acknowledgement, GetLoadedMods, GetLoadedModsResponse, Message, MessageKey,
	MessageType, SetModState,
};

/// Errors from standing up or running the host.
#[derive( Debug, Error )]
pub enum ServerError {
	#[error( "server i/o error: {0}" )]
	Io( #[from] std::io::Error ),
}

/// Context a handler receives alongside its decoded message.
#[derive( Debug, Copy, Clone )]
pub struct MessageMetadata {
	/// Correlation key of the incoming frame; replies must echo it.
	pub key: MessageKey,
	/// Address of the controller that sent the frame.
	pub peer: SocketAddr,
}

type Handler = Arc<dyn Fn( &[u8], &MessageMetadata ) -> Option<Vec<u8>> + Send + Sync>;

/// Routes frame bodies to per-type handlers.
///
/// Registration serializes on the write lock; dispatch takes the read lock,
/// so concurrent connections route without contention. A frame whose type has
/// no handler is dropped, not an error: controllers may speak a newer
/// protocol revision than this host.
#[derive( Default )]
pub struct Dispatcher {
	handlers: RwLock<HashMap<MessageType, Handler>>,
}

impl Dispatcher {

	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` for `M`, replacing any previous handler for that type.
	///
	/// The handler returns the encoded reply frame body to send back, or
	/// `None` for messages that warrant no reply.
	pub fn add_or_override_handler<M, F>( &self, handler: F )
	where
		M: Message,
		F: Fn( M, &MessageMetadata ) -> Option<Vec<u8>> + Send + Sync + 'static,
	{
		let wrapped: Handler = Arc::new( move | raw, metadata | {
			match protocol::decode::<M>( raw ) {
				Ok(( message, _key )) => handler( message, metadata ),
				Err( error ) => {
					tracing::warn!( %error, peer = %metadata.peer, "dropping undecodable frame" );
					None
				}
			}
		});
		self.handlers.write().insert( M::TYPE, wrapped );
	}

	/// Removes the handler for a message type. Returns whether one existed.
	pub fn remove_handler( &self, message_type: MessageType ) -> bool {
		self.handlers.write().remove( &message_type ).is_some()
	}

	/// Routes one frame body: peek the tag, look up, decode, invoke.
	///
	/// Frames with unknown tags or no registered handler are dropped with a
	/// diagnostic; the return value is the encoded reply, if any.
	pub fn handle( &self, raw: &[u8], metadata: &MessageMetadata ) -> Option<Vec<u8>> {
		let tag = match protocol::peek( raw ) {
			Ok(( tag, _key )) => tag,
			Err( error ) => {
				tracing::warn!( %error, peer = %metadata.peer, "dropping malformed frame" );
				return None ;
			}
		};
		let Some( message_type ) = MessageType::from_tag( tag ) else {
			tracing::debug!( tag, peer = %metadata.peer, "dropping frame with unknown type tag" );
			return None ;
		};
		let handler = {
			let handlers = self.handlers.read();
			match handlers.get( &message_type ) {
				Some( handler ) => Arc::clone( handler ),
				None => {
					tracing::debug!( ?message_type, "no handler registered, frame dropped" );
					return None ;
				}
			}
		};
		// Invoked with the registry lock released: a handler may register or
		// remove handlers, including itself.
		handler( raw, metadata )
	}

}

/// The RPC host: a TCP listener wired to a [`Loader`].
///
/// Dropping the host (or calling [`shutdown`]( Self::shutdown )) stops the
/// accept loop and every connection task.
pub struct Host {
	local_addr: SocketAddr,
	dispatcher: Arc<Dispatcher>,
	shutdown: CancellationToken,
}

impl Host {

	/// Binds the host and registers the loader's command handlers.
	///
	/// Bind to port 0 to let the OS pick; [`local_addr`]( Self::local_addr )
	/// reports the actual address.
	pub async fn bind( loader: Arc<Loader>, addr: SocketAddr ) -> Result<Self, ServerError> {
		let listener = TcpListener::bind( addr ).await?;
		let local_addr = listener.local_addr()?;

		let dispatcher = Arc::new( Dispatcher::new() );
		register_loader_handlers( &dispatcher, &loader );

		let shutdown = CancellationToken::new();
		tokio::spawn( accept_loop( listener, Arc::clone( &dispatcher ), shutdown.child_token() ));
		tracing::info!( %local_addr, "loader host listening" );

		Ok( Self { local_addr, dispatcher, shutdown })
	}

	/// The address this host actually listens on.
	#[inline] pub fn local_addr( &self ) -> SocketAddr { self.local_addr }

	/// The host's dispatcher, for registering additional handlers.
	#[inline] pub fn dispatcher( &self ) -> &Arc<Dispatcher> { &self.dispatcher }

	/// Stops the accept loop and all connection tasks.
	pub fn shutdown( &self ) {
		self.shutdown.cancel();
	}

}

impl Drop for Host {
	fn drop( &mut self ) {
		self.shutdown.cancel();
	}
}

/// Wires the loader's two commands into a dispatcher.
fn register_loader_handlers( dispatcher: &Dispatcher, loader: &Arc<Loader> ) {

	let snapshot_loader = Arc::clone( loader );
	dispatcher.add_or_override_handler::<GetLoadedMods, _>( move | _request, metadata | {
		let response = GetLoadedModsResponse { mods: snapshot_loader.server_mod_info() };
		encode_reply( &response, metadata )
	});

	let state_loader = Arc::clone( loader );
	dispatcher.add_or_override_handler::<SetModState, _>( move | request, metadata | {
		// A failed command still gets a reply: the error rides back as an
		// exception acknowledgement under the request's key.
		let ack = match state_loader.set_mod_state( &request.mod_id, request.state ) {
			Ok(()) => Acknowledgement::success(),
			Err( error ) => Acknowledgement::exception( error.to_string() ),
		};
		encode_reply( &ack, metadata )
	});

}

fn encode_reply<M: Message>( reply: &M, metadata: &MessageMetadata ) -> Option<Vec<u8>> {
	match protocol::encode( reply, metadata.key ) {
		Ok( body ) => Some( body ),
		Err( error ) => {
			tracing::error!( %error, "failed to encode reply" );
			None
		}
	}
}

async fn accept_loop( listener: TcpListener, dispatcher: Arc<Dispatcher>, shutdown: CancellationToken ) {
	loop {
		tokio::select! {
			() = shutdown.cancelled() => break,
			accepted = listener.accept() => match accepted {
				Ok(( stream, peer )) => {
					tracing::debug!( %peer, "controller connected" );
					tokio::spawn( serve_connection(
						stream,
						peer,
						Arc::clone( &dispatcher ),
						shutdown.child_token(),
					));
				}
				Err( error ) => tracing::warn!( %error, "accept failed" ),
			}
		}
	}
}

async fn serve_connection(
	stream: TcpStream,
	peer: SocketAddr,
	dispatcher: Arc<Dispatcher>,
	shutdown: CancellationToken,
) {
	let mut framed = Framed::new( stream, LengthDelimitedCodec::new() );

	loop {
		tokio::select! {
			() = shutdown.cancelled() => break,
			frame = framed.next() => {
				let raw = match frame {
					Some( Ok( raw )) => raw.freeze(),
					Some( Err( error )) => {
						tracing::warn!( %peer, %error, "connection read failed" );
						break ;
					}
					None => break,
				};
				let key = match protocol::peek( &raw ) {
					Ok(( _tag, key )) => key,
					Err( error ) => {
						tracing::warn!( %peer, %error, "dropping malformed frame" );
						continue ;
					}
				};

				let metadata = MessageMetadata { key, peer };
				let handler_dispatcher = Arc::clone( &dispatcher );
				// Handlers may block on loader locks and mod hooks; keep them
				// off the async worker threads.
				let reply = tokio::task::spawn_blocking( move || {
					handler_dispatcher.handle( &raw, &metadata )
				}).await;

				match reply {
					Ok( Some( body )) => {
						if let Err( error ) = framed.send( Bytes::from( body )).await {
							tracing::warn!( %peer, %error, "connection write failed" );
							break ;
						}
					}
					Ok( None ) => {}
					Err( join_error ) => {
						tracing::error!( %peer, %join_error, "handler panicked" );
					}
				}
			}
		}
	}

	tracing::debug!( %peer, "controller disconnected" );
}
