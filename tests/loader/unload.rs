use mod_link::{ Loader, LoaderError };

use crate::test_configs::{ catalogue, config };
use crate::test_mods::{ api, Counters, CountingMod, FakeSource };

#[test]
fn loader_unload_removes_and_disposes() {

	let configs = [ config( "app.mod", &[] ) ];
	let counters = Counters::new();
	let source = FakeSource::new().with_counting( "app.mod", &counters );
	let loader = Loader::new( api(), Box::new( source ), catalogue( &configs ));

	loader.load_mod( "app.mod" ).unwrap();
	loader.unload_mod( "app.mod" ).unwrap();

	assert!( !loader.is_loaded( "app.mod" ));
	assert_eq!( counters.disposings(), 1 );
	assert_eq!( counters.unloads(), 1 );

	let error = loader.unload_mod( "app.mod" ).unwrap_err();
	assert!( matches!( error, LoaderError::NotLoaded( _ )));

}

#[test]
fn loader_unload_blocked_by_capability() {

	let configs = [ config( "resident", &[] ) ];
	let counters = Counters::new();
	let resident = counters.clone();
	let source = FakeSource::new()
		.with( "resident", move || CountingMod::new( &resident ).unloadable( false ).into_object() );
	let loader = Loader::new( api(), Box::new( source ), catalogue( &configs ));

	loader.load_mod( "resident" ).unwrap();
	let error = loader.unload_mod( "resident" ).unwrap_err();

	assert!( matches!( error, LoaderError::Unsupported { operation: "unload", .. } ));
	assert!( loader.is_loaded( "resident" ), "a refused unload leaves the mod in place" );
	assert_eq!( counters.unloads(), 0 );

}

#[test]
fn loader_unload_hook_fault_reported_but_mod_removed() {

	let configs = [ config( "stubborn", &[] ) ];
	let counters = Counters::new();
	let stubborn = counters.clone();
	let source = FakeSource::new()
		.with( "stubborn", move || CountingMod::new( &stubborn ).fail_unload().into_object() );
	let loader = Loader::new( api(), Box::new( source ), catalogue( &configs ));

	loader.load_mod( "stubborn" ).unwrap();
	let error = loader.unload_mod( "stubborn" ).unwrap_err();

	assert!( matches!( error, LoaderError::Dispose { .. } ));
	assert!( !loader.is_loaded( "stubborn" ));

}
