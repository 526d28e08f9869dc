use mod_link::{ Loader, LoaderError, ModState };

use crate::test_configs::{ catalogue, config };
use crate::test_mods::{ api, Counters, CountingMod, FakeSource };

#[test]
fn loader_suspend_and_resume() {

	let configs = [ config( "pausable", &[] ) ];
	let counters = Counters::new();
	let source = FakeSource::new().with_counting( "pausable", &counters );
	let loader = Loader::new( api(), Box::new( source ), catalogue( &configs ));
	loader.load_mod( "pausable" ).unwrap();

	loader.suspend_mod( "pausable" ).unwrap();
	assert_eq!( loader.get_loaded_mod_info()[0].state, ModState::Suspended );

	loader.resume_mod( "pausable" ).unwrap();
	assert_eq!( loader.get_loaded_mod_info()[0].state, ModState::Running );

	assert_eq!( counters.suspends(), 1 );
	assert_eq!( counters.resumes(), 1 );

}

#[test]
fn loader_suspend_requires_capability() {

	let configs = [ config( "always.on", &[] ) ];
	let counters = Counters::new();
	let fixed = counters.clone();
	let source = FakeSource::new()
		.with( "always.on", move || CountingMod::new( &fixed ).suspendable( false ).into_object() );
	let loader = Loader::new( api(), Box::new( source ), catalogue( &configs ));
	loader.load_mod( "always.on" ).unwrap();

	let error = loader.suspend_mod( "always.on" ).unwrap_err();

	assert!( matches!( error, LoaderError::Unsupported { operation: "suspend", .. } ));
	assert_eq!( counters.suspends(), 0 );

}

#[test]
fn loader_suspend_unloaded_mod_rejected() {

	let loader = Loader::new( api(), Box::new( FakeSource::new() ), Vec::new() );

	let error = loader.suspend_mod( "ghost" ).unwrap_err();

	assert!( matches!( error, LoaderError::NotLoaded( _ )));

}
