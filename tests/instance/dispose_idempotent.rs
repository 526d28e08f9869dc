use mod_link::ModInstance ;

use crate::test_configs::config ;
use crate::test_mods::{ api, Counters, CountingMod };

#[test]
fn instance_dispose_runs_hooks_once() {

	let counters = Counters::new();
	let mut instance = ModInstance::in_process(
		CountingMod::new( &counters ).into_object(),
		config( "app.mod", &[] ),
	);
	instance.start( &api() ).unwrap();

	instance.dispose().unwrap();
	instance.dispose().unwrap();

	assert_eq!( counters.disposings(), 1 );
	assert_eq!( counters.unloads(), 1 );

}

#[test]
fn instance_drop_disposes() {

	let counters = Counters::new();
	{
		let mut instance = ModInstance::in_process(
			CountingMod::new( &counters ).into_object(),
			config( "app.mod", &[] ),
		);
		instance.start( &api() ).unwrap();
	}

	assert_eq!( counters.unloads(), 1 );

}

#[test]
fn instance_drop_after_dispose_does_not_repeat() {

	let counters = Counters::new();
	{
		let mut instance = ModInstance::in_process(
			CountingMod::new( &counters ).into_object(),
			config( "app.mod", &[] ),
		);
		instance.start( &api() ).unwrap();
		instance.dispose().unwrap();
	}

	assert_eq!( counters.unloads(), 1 );
	assert_eq!( counters.disposings(), 1 );

}
