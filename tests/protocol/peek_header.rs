use mod_link::protocol::{
	encode, peek, GetLoadedMods, MessageKey, MessageType, ProtocolError,
};

#[test]
fn protocol_peek_reads_tag_and_key_only() {

	let body = encode( &GetLoadedMods, MessageKey( 42 )).unwrap();

	let ( tag, key ) = peek( &body ).unwrap();

	assert_eq!( MessageType::from_tag( tag ), Some( MessageType::GetLoadedMods ));
	assert_eq!( key, MessageKey( 42 ));

	// The payload is irrelevant to a peek.
	let ( tag, key ) = peek( &body[..3] ).unwrap();
	assert_eq!( tag, MessageType::GetLoadedMods.tag() );
	assert_eq!( key, MessageKey( 42 ));

}

#[test]
fn protocol_peek_rejects_truncated_header() {

	let error = peek( &[ 1, 0 ]).unwrap_err();

	assert!( matches!( error, ProtocolError::Truncated { len: 2 } ));

}

#[test]
fn protocol_unknown_tag_unmapped() {

	assert_eq!( MessageType::from_tag( 200 ), None );

	for message_type in [
		MessageType::Acknowledgement,
		MessageType::GetLoadedMods,
		MessageType::GetLoadedModsResponse,
		MessageType::SetModState,
	] {
		assert_eq!( MessageType::from_tag( message_type.tag() ), Some( message_type ));
	}

}
