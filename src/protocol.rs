//! Wire protocol between the loader host and external controllers.
//!
//! Every message travels inside a length-delimited transport frame whose body
//! is `[type tag: u8][correlation key: u16 LE][payload]`. The tag and key
//! decode without touching the payload, so a dispatcher can route a frame
//! before paying for deserialization. Each message type statically declares
//! how its payload is serialized and compressed ([`WireFormat`]): small
//! commands travel as plain bincode, while the mod-list response compresses
//! its config snapshots with deflate.

use std::io::{ Read, Write };

use serde::de::DeserializeOwned ;
use serde::{ Deserialize, Serialize };
use thiserror::Error ;

use crate::config::ModConfig ;
use crate::instance::ModState ;

/// Bytes of header (tag + key) preceding every payload.
pub const HEADER_LEN: usize = 3 ;

/// Correlation key pairing a response with the request that caused it.
///
/// A response echoes its request's key unchanged. A client must not reuse a
/// key while a request with that key is still in flight, which bounds each
/// client to 65536 concurrent requests.
#[derive( Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize )]
pub struct MessageKey( pub u16 );

impl std::fmt::Display for MessageKey {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		write!( f, "{}", self.0 )
	}
}

/// Discriminates message types on the wire. The tag values are the protocol;
/// they never change meaning across versions, only grow.
#[derive( Debug, Copy, Clone, PartialEq, Eq, Hash )]
#[repr( u8 )]
pub enum MessageType {
	Acknowledgement = 0,
	GetLoadedMods = 1,
	GetLoadedModsResponse = 2,
	SetModState = 3,
}

impl MessageType {

	/// This type's wire tag.
	#[inline] pub fn tag( self ) -> u8 { self as u8 }

	/// Maps a wire tag back to a known message type.
	///
	/// Unknown tags return `None`; receivers drop such frames with a
	/// diagnostic so newer peers can speak to older hosts.
	pub fn from_tag( tag: u8 ) -> Option<Self> {
		match tag {
			0 => Some( Self::Acknowledgement ),
			1 => Some( Self::GetLoadedMods ),
			2 => Some( Self::GetLoadedModsResponse ),
			3 => Some( Self::SetModState ),
			_ => None,
		}
	}

}

/// Payload serializer of one message type.
#[derive( Debug, Copy, Clone, PartialEq, Eq )]
pub enum Serializer {
	Bincode,
	Json,
}

/// Payload compressor of one message type.
#[derive( Debug, Copy, Clone, PartialEq, Eq )]
pub enum Compressor {
	None,
	Deflate,
}

/// How one message type's payload is laid out on the wire.
#[derive( Debug, Copy, Clone, PartialEq, Eq )]
pub struct WireFormat {
	pub serializer: Serializer,
	pub compressor: Compressor,
}

impl WireFormat {
	const BINCODE: Self = Self { serializer: Serializer::Bincode, compressor: Compressor::None };
	const BINCODE_DEFLATE: Self = Self { serializer: Serializer::Bincode, compressor: Compressor::Deflate };
	const JSON: Self = Self { serializer: Serializer::Json, compressor: Compressor::None };
}

/// A message that can travel on the wire.
///
/// The type tag and wire format are associated constants, fixed per type;
/// there is no per-value format negotiation.
pub trait Message: Serialize + DeserializeOwned + Send + 'static {
	const TYPE: MessageType ;
	const FORMAT: WireFormat ;
}

/// Errors from encoding or decoding a frame body.
#[derive( Debug, Error )]
pub enum ProtocolError {
	/// The frame body is shorter than the tag + key header.
	#[error( "frame of {len} bytes is shorter than the {HEADER_LEN} byte header" )]
	Truncated { len: usize },
	/// The frame carries a different message type than the caller decoded it as.
	#[error( "expected {expected:?} (tag {}), got tag {actual}", .expected.tag() )]
	UnexpectedType { expected: MessageType, actual: u8 },
	/// Bincode payload (de)serialization failed.
	#[error( "payload serialization failed: {0}" )]
	Bincode( #[from] bincode::Error ),
	/// JSON payload (de)serialization failed.
	#[error( "payload serialization failed: {0}" )]
	Json( #[from] serde_json::Error ),
	/// Deflate compression or decompression failed.
	#[error( "payload compression failed: {0}" )]
	Compression( #[from] std::io::Error ),
}

/// Reads the tag and correlation key of a frame body without touching the payload.
pub fn peek( raw: &[u8] ) -> Result<( u8, MessageKey ), ProtocolError> {
	if raw.len() < HEADER_LEN {
		return Err( ProtocolError::Truncated { len: raw.len() });
	}
	let key = u16::from_le_bytes([ raw[1], raw[2] ]);
	Ok(( raw[0], MessageKey( key )))
}

/// Encodes a message and its correlation key into a frame body.
pub fn encode<M: Message>( message: &M, key: MessageKey ) -> Result<Vec<u8>, ProtocolError> {
	let payload = match M::FORMAT.serializer {
		Serializer::Bincode => bincode::serialize( message )?,
		Serializer::Json => serde_json::to_vec( message )?,
	};
	let payload = match M::FORMAT.compressor {
		Compressor::None => payload,
		Compressor::Deflate => {
			let mut encoder = flate2::write::DeflateEncoder::new(
				Vec::with_capacity( payload.len() / 2 ),
				flate2::Compression::default(),
			);
			encoder.write_all( &payload )?;
			encoder.finish()?
		}
	};

	let mut body = Vec::with_capacity( HEADER_LEN + payload.len() );
	body.push( M::TYPE.tag() );
	body.extend_from_slice( &key.0.to_le_bytes() );
	body.extend_from_slice( &payload );
	Ok( body )
}

/// Decodes a frame body as a specific message type.
///
/// # Errors
/// [`ProtocolError::UnexpectedType`] if the frame's tag is not `M`'s;
/// callers route on [`peek`] first.
pub fn decode<M: Message>( raw: &[u8] ) -> Result<( M, MessageKey ), ProtocolError> {
	let ( tag, key ) = peek( raw )?;
	if tag != M::TYPE.tag() {
		return Err( ProtocolError::UnexpectedType { expected: M::TYPE, actual: tag });
	}

	let payload = &raw[HEADER_LEN..];
	let message = match M::FORMAT.compressor {
		Compressor::None => deserialize_as::<M>( payload )?,
		Compressor::Deflate => {
			let mut inflated = Vec::with_capacity( payload.len() * 2 );
			flate2::read::DeflateDecoder::new( payload ).read_to_end( &mut inflated )?;
			deserialize_as::<M>( &inflated )?
		}
	};
	Ok(( message, key ))
}

fn deserialize_as<M: Message>( payload: &[u8] ) -> Result<M, ProtocolError> {
	match M::FORMAT.serializer {
		Serializer::Bincode => Ok( bincode::deserialize( payload )? ),
		Serializer::Json => Ok( serde_json::from_slice( payload )? ),
	}
}

/// State transition a controller can request for a mod.
#[derive( Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub enum ModStateType {
	/// Load the mod (and its dependencies).
	Load,
	/// Unload the mod and reclaim its binary.
	Unload,
	/// Suspend a running mod.
	Suspend,
	/// Resume a suspended mod.
	Resume,
}

/// Summary of one loaded mod for in-process consumers.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct ModInfo {
	pub mod_id: String,
	pub state: ModState,
	pub can_suspend: bool,
	pub can_unload: bool,
}

/// Full record of one loaded mod as reported to RPC controllers.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct ServerModInfo {
	pub config: ModConfig,
	pub state: ModState,
	pub can_suspend: bool,
	pub can_unload: bool,
}

impl ServerModInfo {

	/// True if a controller may usefully send a suspend command for this mod.
	pub fn can_send_suspend( &self ) -> bool {
		self.can_suspend && self.state == ModState::Running
	}

	/// True if a controller may usefully send a resume command for this mod.
	pub fn can_send_resume( &self ) -> bool {
		self.can_suspend && self.state == ModState::Suspended
	}

}

/// Requests the host's current loaded mod list.
#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
pub struct GetLoadedMods ;

impl Message for GetLoadedMods {
	const TYPE: MessageType = MessageType::GetLoadedMods ;
	const FORMAT: WireFormat = WireFormat::BINCODE ;
}

/// The host's loaded mod list, in load order.
///
/// Carries full config snapshots, so this is the one payload large enough to
/// be worth compressing.
#[derive( Debug, Clone, Default, PartialEq, Serialize, Deserialize )]
pub struct GetLoadedModsResponse {
	pub mods: Vec<ServerModInfo>,
}

impl Message for GetLoadedModsResponse {
	const TYPE: MessageType = MessageType::GetLoadedModsResponse ;
	const FORMAT: WireFormat = WireFormat::BINCODE_DEFLATE ;
}

/// Asks the host to drive one mod towards a target state.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct SetModState {
	pub mod_id: String,
	pub state: ModStateType,
}

impl Message for SetModState {
	const TYPE: MessageType = MessageType::SetModState ;
	const FORMAT: WireFormat = WireFormat::BINCODE ;
}

/// Acknowledgement-or-exception reply to a command.
///
/// A successful command acknowledges with no message; a failed one carries
/// the error text. JSON keeps the reply readable to any controller.
#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
pub struct Acknowledgement {
	pub message: Option<String>,
}

impl Acknowledgement {

	/// A plain success acknowledgement.
	pub fn success() -> Self {
		Self { message: None }
	}

	/// An acknowledgement carrying an error description.
	pub fn exception( message: impl Into<String> ) -> Self {
		Self { message: Some( message.into() )}
	}

	/// True if the acknowledged command failed on the host.
	#[inline] pub fn is_exception( &self ) -> bool { self.message.is_some() }

}

impl Message for Acknowledgement {
	const TYPE: MessageType = MessageType::Acknowledgement ;
	const FORMAT: WireFormat = WireFormat::JSON ;
}
