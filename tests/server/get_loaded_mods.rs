use std::sync::Arc ;

use mod_link::{ Client, Host, Loader, ModState };

use crate::test_configs::{ catalogue, config };
use crate::test_mods::{ api, init_tracing, Counters, FakeSource };

#[tokio::test]
async fn server_get_loaded_mods_roundtrip() {

	init_tracing();

	let configs = [
		config( "app.core", &[] ),
		config( "app.ui", &[ "app.core" ]),
	];
	let counters = Counters::new();
	let source = FakeSource::new()
		.with_counting( "app.core", &counters )
		.with_counting( "app.ui", &counters );
	let loader = Arc::new( Loader::new( api(), Box::new( source ), catalogue( &configs )));
	loader.load_mod( "app.ui" ).unwrap();

	let host = Host::bind( Arc::clone( &loader ), "127.0.0.1:0".parse().unwrap() ).await.unwrap();
	let client = Client::connect( host.local_addr() ).await.unwrap();

	let mods = client.get_loaded_mods().await.unwrap();

	assert_eq!( mods.len(), 2 );
	assert_eq!( mods[0].config.mod_id, "app.core" );
	assert_eq!( mods[1].config.mod_id, "app.ui" );
	assert!( mods.iter().all(| info | info.state == ModState::Running ));
	// Full config snapshots travel with the response.
	assert_eq!( mods[1].config.mod_dependencies, [ "app.core" ]);

}
