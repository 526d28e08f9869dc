use mod_link::{ ModConfig, ModState, ServerModInfo };

fn info( state: ModState, can_suspend: bool ) -> ServerModInfo {
	ServerModInfo {
		config: ModConfig::with_id( "app.mod" ),
		state,
		can_suspend,
		can_unload: true,
	}
}

#[test]
fn protocol_server_mod_info_command_flags() {

	let running = info( ModState::Running, true );
	assert!( running.can_send_suspend() );
	assert!( !running.can_send_resume() );

	let suspended = info( ModState::Suspended, true );
	assert!( !suspended.can_send_suspend() );
	assert!( suspended.can_send_resume() );

	let fixed = info( ModState::Running, false );
	assert!( !fixed.can_send_suspend() );
	assert!( !fixed.can_send_resume() );

}
