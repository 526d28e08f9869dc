use mod_link::{ Loader, LoaderError };
use tokio_util::sync::CancellationToken ;

use crate::test_configs::{ catalogue, config };
use crate::test_mods::{ api, Counters, CountingMod, FakeSource };

#[test]
fn loader_fault_in_one_mod_spares_the_rest() {

	let configs = [
		config( "faulty", &[] ),
		config( "healthy", &[] ),
	];
	let counters = Counters::new();
	let faulty_counters = Counters::new();
	let faulty = faulty_counters.clone();
	let source = FakeSource::new()
		.with( "faulty", move || CountingMod::new( &faulty ).fail_start().into_object() )
		.with_counting( "healthy", &counters );
	let loader = Loader::new( api(), Box::new( source ), catalogue( &configs ));

	let ( loaded, faults ) = loader
		.load_mods_with_dependencies( &[ "faulty", "healthy" ], &CancellationToken::new() )
		.unwrap();

	assert_eq!( loaded, [ "healthy" ]);
	assert_eq!( faults.len(), 1 );
	assert!( matches!( faults[0], LoaderError::Hook { ref mod_id, .. } if mod_id == "faulty" ));
	assert!( !loader.is_loaded( "faulty" ), "a mod that failed to start is not loaded" );
	assert!( loader.is_loaded( "healthy" ));

}
