use anyhow::{anyhow, Result};
use glow::HasContext;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex { pos: [-0.5, -0.5] },
    Vertex { pos: [0.0, 0.5] },
    Vertex { pos: [0.5, -0.5] },
];

pub const POSITION_ATTRIB: &str = "aPos";

/// A static triangle drawn with a single program.
///
/// Owns the GL context, the vertex buffer and the program; all are released on drop.
pub struct Triangle {
    gl: glow::Context,
    program: glow::Program,
    vbo: glow::Buffer,
    a_pos: u32,
    clear_color: [f32; 4],
}

impl Triangle {
    pub fn new(gl: glow::Context, program: glow::Program, clear_color: [f32; 4]) -> Result<Self> {
        let a_pos = match unsafe { gl.get_attrib_location(program, POSITION_ATTRIB) } {
            Some(loc) => loc,
            None => {
                unsafe { gl.delete_program(program) };
                return Err(anyhow!("Shader program has no `{}` attribute", POSITION_ATTRIB));
            }
        };

        let vbo = unsafe {
            match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(e) => {
                    gl.delete_program(program);
                    return Err(anyhow!("Failed to create buffer: {}", e));
                }
            }
        };

        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&TRIANGLE[..]),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        Ok(Self {
            gl,
            program,
            vbo,
            a_pos,
            clear_color,
        })
    }

    pub fn draw(&self, viewport_px: [u32; 2]) {
        let [r, g, b, a] = self.clear_color;

        unsafe {
            self.gl.viewport(0, 0, viewport_px[0] as i32, viewport_px[1] as i32);
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);

            self.gl.use_program(Some(self.program));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.enable_vertex_attrib_array(self.a_pos);
            self.gl.vertex_attrib_pointer_f32(
                self.a_pos,
                2,
                glow::FLOAT,
                false,
                std::mem::size_of::<Vertex>() as i32,
                0,
            );

            self.gl.draw_arrays(glow::TRIANGLES, 0, TRIANGLE.len() as i32);
        }
    }
}

impl Drop for Triangle {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_program(self.program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_data_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8);
        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE[..]);
        assert_eq!(bytes.len(), 24);

        let floats: &[f32] = bytemuck::cast_slice(&TRIANGLE[..]);
        assert_eq!(floats, &[-0.5, -0.5, 0.0, 0.5, 0.5, -0.5]);
    }
}
