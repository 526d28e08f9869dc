use mod_link::protocol::{ decode, encode, Acknowledgement, MessageKey, HEADER_LEN };

#[test]
fn protocol_acknowledgement_or_exception() {

	assert!( !Acknowledgement::success().is_exception() );

	let exception = Acknowledgement::exception( "mod ghost is not loaded" );
	assert!( exception.is_exception() );

	let body = encode( &exception, MessageKey( 9 )).unwrap();
	let ( decoded, key ) = decode::<Acknowledgement>( &body ).unwrap();

	assert_eq!( decoded, exception );
	assert_eq!( key, MessageKey( 9 ));

}

#[test]
fn protocol_acknowledgement_payload_is_json() {

	// Acknowledgements stay readable to controllers in any language.
	let body = encode( &Acknowledgement::success(), MessageKey( 0 )).unwrap();

	let payload: serde_json::Value = serde_json::from_slice( &body[HEADER_LEN..] ).unwrap();
	assert!( payload.is_object() );

}
