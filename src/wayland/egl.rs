use anyhow::{anyhow, Context as _, Result};
use khronos_egl as egl;
use std::ffi::c_void;
use std::ptr;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::Proxy;

const CONFIG_ATTRIBS: [egl::Int; 13] = [
    egl::SURFACE_TYPE, egl::WINDOW_BIT,
    egl::RED_SIZE, 8,
    egl::GREEN_SIZE, 8,
    egl::BLUE_SIZE, 8,
    egl::ALPHA_SIZE, 8,
    egl::RENDERABLE_TYPE, egl::OPENGL_ES2_BIT,
    egl::NONE,
];

const CONTEXT_ATTRIBS: [egl::Int; 3] = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];

/// A GLES2 context bound to a single Wayland surface.
pub struct EglContext {
    instance: egl::Instance<egl::Static>,
    display: egl::Display,
    context: egl::Context,
    surface: egl::Surface,
    // Must outlive `surface`
    window: wayland_egl::WlEglSurface,
}

impl EglContext {
    pub fn new(wl_display: *mut c_void, wl_surface: &WlSurface, size: [u32; 2]) -> Result<Self> {
        let instance = egl::Instance::new(egl::Static);

        let display = unsafe {
            instance
                .get_display(wl_display as egl::NativeDisplayType)
                .ok_or_else(|| anyhow!("Failed to get EGL display"))?
        };

        let (major, minor) = instance.initialize(display).context("Failed to initialize EGL")?;
        log::info!("EGL version: {}.{}", major, minor);

        let config = instance
            .choose_first_config(display, &CONFIG_ATTRIBS)?
            .ok_or_else(|| anyhow!("No EGL config found"))?;

        instance.bind_api(egl::OPENGL_ES_API)?;
        let context = instance
            .create_context(display, config, None, &CONTEXT_ATTRIBS)
            .context("Failed to create EGL context")?;

        let window = unsafe {
            wayland_egl::WlEglSurface::new_from_raw(
                wl_surface.id().as_ptr() as *mut _,
                size[0] as i32,
                size[1] as i32,
            )
        }
        .context("Failed to create wl_egl_window")?;

        let surface = unsafe {
            instance.create_window_surface(
                display,
                config,
                window.ptr() as egl::NativeWindowType,
                None,
            )
        }
        .context("Failed to create EGL window surface")?;

        unsafe {
            instance.make_current(display, Some(surface), Some(surface), Some(context))?;
        }

        Ok(Self {
            instance,
            display,
            context,
            surface,
            window,
        })
    }

    pub fn resize(&mut self, size: [u32; 2]) {
        self.window.resize(size[0] as i32, size[1] as i32, 0, 0);
    }

    pub fn swap_buffers(&self) -> Result<()> {
        unsafe {
            self.instance.swap_buffers(self.display, self.surface)?;
        }
        Ok(())
    }

    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.instance
            .get_proc_address(name)
            .map(|f| f as *const c_void)
            .unwrap_or(ptr::null())
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.instance.make_current(self.display, None, None, None);
            let _ = self.instance.destroy_surface(self.display, self.surface);
            let _ = self.instance.destroy_context(self.display, self.context);
            let _ = self.instance.terminate(self.display);
        }
    }
}
