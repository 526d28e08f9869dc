use std::sync::Arc ;

use mod_link::{ Client, Host, Loader };

use crate::test_configs::{ catalogue, config };
use crate::test_mods::{ api, init_tracing, Counters, FakeSource };

#[tokio::test( flavor = "multi_thread" )]
async fn server_concurrent_requests_correlate_by_key() {

	init_tracing();

	let configs = [
		config( "app.a", &[] ),
		config( "app.b", &[] ),
	];
	let counters = Counters::new();
	let source = FakeSource::new()
		.with_counting( "app.a", &counters )
		.with_counting( "app.b", &counters );
	let loader = Arc::new( Loader::new( api(), Box::new( source ), catalogue( &configs )));
	loader.load_mod( "app.a" ).unwrap();
	loader.load_mod( "app.b" ).unwrap();

	let host = Host::bind( Arc::clone( &loader ), "127.0.0.1:0".parse().unwrap() ).await.unwrap();
	let client = Arc::new( Client::connect( host.local_addr() ).await.unwrap() );

	// Fire many list requests through one connection at once; every task
	// must get a complete response matched to its own request.
	let tasks: Vec<_> = ( 0..32 )
		.map(| _ | {
			let client = Arc::clone( &client );
			tokio::spawn( async move { client.get_loaded_mods().await })
		})
		.collect();

	for task in tasks {
		let mods = task.await.unwrap().unwrap();
		assert_eq!( mods.len(), 2 );
	}

	// Commands interleave with queries on the same connection.
	let ( suspended, listed ) = tokio::join!(
		client.suspend_mod( "app.a" ),
		client.get_loaded_mods(),
	);
	suspended.unwrap();
	assert_eq!( listed.unwrap().len(), 2 );

}
