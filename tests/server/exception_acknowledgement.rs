use std::sync::Arc ;

use mod_link::{ Client, ClientError, Host, Loader };

use crate::test_mods::{ api, init_tracing, FakeSource };

#[tokio::test]
async fn server_exception_acknowledgement_for_unknown_mod() {

	init_tracing();

	let loader = Arc::new( Loader::new( api(), Box::new( FakeSource::new() ), Vec::new() ));
	let host = Host::bind( Arc::clone( &loader ), "127.0.0.1:0".parse().unwrap() ).await.unwrap();
	let client = Client::connect( host.local_addr() ).await.unwrap();

	let error = client.suspend_mod( "ghost" ).await.unwrap_err();

	// The failure crossed the wire as an exception acknowledgement.
	match error {
		ClientError::Host( text ) => assert!( text.contains( "ghost" ), "unexpected text: {text}" ),
		other => panic!( "expected a host-side error, got: {other}" ),
	}

}
