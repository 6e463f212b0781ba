pub mod egl;

use log::{info, warn};
use wayland_client::{
    protocol::{wl_compositor, wl_keyboard, wl_registry, wl_seat, wl_surface},
    Connection, Dispatch, QueueHandle, WEnum,
};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};
use xkbcommon::xkb::{self, keysyms, Context, Keymap, State as XkbState, CONTEXT_NO_FLAGS, KEYMAP_COMPILE_NO_FLAGS};

pub struct WaylandState {
    pub running: bool,
    pub configured: bool,
    pub compositor: Option<wl_compositor::WlCompositor>,
    pub wm_base: Option<xdg_wm_base::XdgWmBase>,
    pub surface: Option<wl_surface::WlSurface>,
    pub xdg_surface: Option<xdg_surface::XdgSurface>,
    pub toplevel: Option<xdg_toplevel::XdgToplevel>,
    pub seat: Option<wl_seat::WlSeat>,
    pub keyboard: Option<wl_keyboard::WlKeyboard>,
    /// Size requested by the compositor in the last toplevel configure
    pub pending_size: Option<[u32; 2]>,
    pub xkb_context: Context,
    pub xkb_state: Option<XkbState>,
}

impl WaylandState {
    pub fn new() -> Self {
        Self {
            running: true,
            configured: false,
            compositor: None,
            wm_base: None,
            surface: None,
            xdg_surface: None,
            toplevel: None,
            seat: None,
            keyboard: None,
            pending_size: None,
            xkb_context: Context::new(CONTEXT_NO_FLAGS),
            xkb_state: None,
        }
    }

    /// Creates the surface and maps it as an xdg toplevel.
    pub fn create_window(&mut self, qh: &QueueHandle<Self>, title: &str) -> anyhow::Result<()> {
        let compositor = self
            .compositor
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Compositor does not advertise wl_compositor"))?;
        let wm_base = self
            .wm_base
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Compositor does not advertise xdg_wm_base"))?;

        let surface = compositor.create_surface(qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, qh, ());
        let toplevel = xdg_surface.get_toplevel(qh, ());
        toplevel.set_title(title.to_string());
        toplevel.set_app_id("trigon".to_string());
        surface.commit();

        self.surface = Some(surface);
        self.xdg_surface = Some(xdg_surface);
        self.toplevel = Some(toplevel);
        Ok(())
    }

    fn handle_key(&mut self, key: u32) {
        let sym = match &self.xkb_state {
            Some(state) => state.key_get_one_sym(xkb::Keycode::new(xkb_keycode(key))).raw(),
            None => return,
        };
        if sym == keysyms::KEY_Escape {
            info!("Escape pressed, closing");
            self.running = false;
        }
    }
}

/// evdev codes are offset by 8 in xkb keycodes.
fn xkb_keycode(evdev: u32) -> u32 {
    evdev.saturating_add(8)
}

impl Default for WaylandState {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WaylandState {
    fn drop(&mut self) {
        if let Some(toplevel) = self.toplevel.take() {
            toplevel.destroy();
        }
        if let Some(xdg_surface) = self.xdg_surface.take() {
            xdg_surface.destroy();
        }
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match &interface[..] {
                "wl_compositor" => {
                    state.compositor = Some(registry.bind::<wl_compositor::WlCompositor, _, _>(
                        name,
                        version.min(4),
                        qh,
                        (),
                    ));
                }
                "xdg_wm_base" => {
                    state.wm_base = Some(registry.bind::<xdg_wm_base::XdgWmBase, _, _>(
                        name,
                        version.min(2),
                        qh,
                        (),
                    ));
                }
                "wl_seat" => {
                    state.seat = Some(registry.bind::<wl_seat::WlSeat, _, _>(
                        name,
                        version.min(5),
                        qh,
                        (),
                    ));
                }
                _ => {}
            }
        }
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for WaylandState {
    fn event(_: &mut Self, _: &wl_compositor::WlCompositor, _: wl_compositor::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<wl_surface::WlSurface, ()> for WaylandState {
    fn event(_: &mut Self, _: &wl_surface::WlSurface, _: wl_surface::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for WaylandState {
    fn event(
        _: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for WaylandState {
    fn event(
        state: &mut Self,
        xdg_surface: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            xdg_surface.ack_configure(serial);
            state.configured = true;
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            // 0x0 leaves the size up to us
            xdg_toplevel::Event::Configure { width, height, .. } if width > 0 && height > 0 => {
                state.pending_size = Some([width as u32, height as u32]);
            }
            xdg_toplevel::Event::Close => {
                info!("Window closed by compositor");
                state.running = false;
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_seat::WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(caps),
        } = event
        {
            if caps.contains(wl_seat::Capability::Keyboard) && state.keyboard.is_none() {
                state.keyboard = Some(seat.get_keyboard(qh, ()));
            }
        }
    }
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_keyboard::Event::Keymap { format, fd, size } => {
                if !matches!(format, WEnum::Value(wl_keyboard::KeymapFormat::XkbV1)) {
                    warn!("Unsupported keymap format {:?}", format);
                    return;
                }
                let keymap = unsafe {
                    Keymap::new_from_fd(
                        &state.xkb_context,
                        fd,
                        size as usize,
                        xkb::KEYMAP_FORMAT_TEXT_V1,
                        KEYMAP_COMPILE_NO_FLAGS,
                    )
                };
                match keymap {
                    Ok(Some(keymap)) => state.xkb_state = Some(XkbState::new(&keymap)),
                    Ok(None) => warn!("Compositor sent an empty keymap"),
                    Err(e) => warn!("Failed to read keymap: {}", e),
                }
            }
            wl_keyboard::Event::Key {
                key,
                state: WEnum::Value(wl_keyboard::KeyState::Pressed),
                ..
            } => state.handle_key(key),
            _ => {}
        }
    }
}
