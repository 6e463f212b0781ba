use super::{shader_source::ShaderSource, ShaderError, ShaderStage};
use glow::HasContext;
use log::{info, warn};

const EMPTY_LOG: &str = "(driver returned an empty info log)";

/// The slice of the GL API needed to build a program.
pub trait ShaderDriver {
    type Shader: Copy;
    type Program: Copy;

    fn create_program(&self) -> Result<Self::Program, String>;
    fn delete_program(&self, program: Self::Program);
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn delete_shader(&self, shader: Self::Shader);

    /// Uploads the source and compiles it, returning the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Links the program, returning the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
}

impl ShaderDriver for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;

    fn create_program(&self) -> Result<glow::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<glow::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_type()) }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn compile_shader(&self, shader: glow::Shader, source: &str) -> bool {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: glow::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: glow::Program) -> bool {
        unsafe {
            HasContext::link_program(self, program);
            self.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: glow::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }
}

fn non_empty(log: String) -> String {
    if log.trim().is_empty() {
        EMPTY_LOG.to_string()
    } else {
        log
    }
}

fn compile_stage<D: ShaderDriver>(
    driver: &D,
    stage: ShaderStage,
    source: &str,
) -> Result<D::Shader, ShaderError> {
    let shader = driver.create_shader(stage).map_err(ShaderError::Driver)?;

    if !driver.compile_shader(shader, source) {
        let log = non_empty(driver.shader_info_log(shader));
        driver.delete_shader(shader);
        return Err(ShaderError::Compile { stage, log });
    }

    Ok(shader)
}

/// Compiles both stages and links them into a program.
///
/// On any failure every object created along the way is released and nothing
/// is attached to a half-built program. The intermediate shader objects are
/// always deleted once the link has been attempted.
pub fn build_program<D: ShaderDriver>(
    driver: &D,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<D::Program, ShaderError> {
    let program = driver.create_program().map_err(ShaderError::Driver)?;

    let vertex = match compile_stage(driver, ShaderStage::Vertex, vertex_src) {
        Ok(shader) => shader,
        Err(err) => {
            driver.delete_program(program);
            return Err(err);
        }
    };
    let fragment = match compile_stage(driver, ShaderStage::Fragment, fragment_src) {
        Ok(shader) => shader,
        Err(err) => {
            driver.delete_shader(vertex);
            driver.delete_program(program);
            return Err(err);
        }
    };

    driver.attach_shader(program, vertex);
    driver.attach_shader(program, fragment);
    let linked = driver.link_program(program);

    for shader in [vertex, fragment] {
        driver.detach_shader(program, shader);
        driver.delete_shader(shader);
    }

    if !linked {
        let log = non_empty(driver.program_info_log(program));
        driver.delete_program(program);
        return Err(ShaderError::Link { log });
    }

    let log = driver.program_info_log(program);
    if !log.trim().is_empty() {
        warn!("Program linked with messages: {}", log.trim());
    }

    Ok(program)
}

pub fn load_shader_program<D: ShaderDriver>(
    driver: &D,
    source: &ShaderSource,
) -> Result<D::Program, ShaderError> {
    let program = build_program(
        driver,
        source.get(ShaderStage::Vertex),
        source.get(ShaderStage::Fragment),
    )?;
    info!("Shader program built");
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateProgram(u32),
        DeleteProgram(u32),
        CreateShader(u32, ShaderStage),
        DeleteShader(u32),
        Compile(u32),
        Attach(u32, u32),
        Detach(u32, u32),
        Link(u32),
    }

    /// Records every call; any source containing `BROKEN` fails to compile.
    #[derive(Default)]
    struct FakeDriver {
        next_id: RefCell<u32>,
        calls: RefCell<Vec<Call>>,
        fail_link: bool,
        quiet_logs: bool,
    }

    impl FakeDriver {
        fn id(&self) -> u32 {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            *next
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn live_objects(&self) -> Vec<u32> {
            let mut live = Vec::new();
            for call in self.calls.borrow().iter() {
                match *call {
                    Call::CreateProgram(id) | Call::CreateShader(id, _) => live.push(id),
                    Call::DeleteProgram(id) | Call::DeleteShader(id) => live.retain(|&x| x != id),
                    _ => {}
                }
            }
            live
        }

        fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| f(c)).count()
        }
    }

    impl ShaderDriver for FakeDriver {
        type Shader = u32;
        type Program = u32;

        fn create_program(&self) -> Result<u32, String> {
            let id = self.id();
            self.calls.borrow_mut().push(Call::CreateProgram(id));
            Ok(id)
        }

        fn delete_program(&self, program: u32) {
            self.calls.borrow_mut().push(Call::DeleteProgram(program));
        }

        fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
            let id = self.id();
            self.calls.borrow_mut().push(Call::CreateShader(id, stage));
            Ok(id)
        }

        fn delete_shader(&self, shader: u32) {
            self.calls.borrow_mut().push(Call::DeleteShader(shader));
        }

        fn compile_shader(&self, shader: u32, source: &str) -> bool {
            self.calls.borrow_mut().push(Call::Compile(shader));
            !source.contains("BROKEN")
        }

        fn shader_info_log(&self, _shader: u32) -> String {
            if self.quiet_logs {
                String::new()
            } else {
                "0:1(1): error: syntax error, unexpected IDENTIFIER".to_string()
            }
        }

        fn attach_shader(&self, program: u32, shader: u32) {
            self.calls.borrow_mut().push(Call::Attach(program, shader));
        }

        fn detach_shader(&self, program: u32, shader: u32) {
            self.calls.borrow_mut().push(Call::Detach(program, shader));
        }

        fn link_program(&self, program: u32) -> bool {
            self.calls.borrow_mut().push(Call::Link(program));
            !self.fail_link
        }

        fn program_info_log(&self, _program: u32) -> String {
            if self.fail_link {
                "error: vertex output not consumed".to_string()
            } else {
                String::new()
            }
        }
    }

    const VERT: &str = "void main() { gl_Position = vec4(0.0); }\n";
    const FRAG: &str = "void main() { gl_FragColor = vec4(1.0); }\n";

    #[test]
    fn builds_and_releases_intermediate_shaders() {
        let driver = FakeDriver::default();
        let program = build_program(&driver, VERT, FRAG).unwrap();

        assert_eq!(
            driver.calls(),
            vec![
                Call::CreateProgram(1),
                Call::CreateShader(2, ShaderStage::Vertex),
                Call::Compile(2),
                Call::CreateShader(3, ShaderStage::Fragment),
                Call::Compile(3),
                Call::Attach(1, 2),
                Call::Attach(1, 3),
                Call::Link(1),
                Call::Detach(1, 2),
                Call::DeleteShader(2),
                Call::Detach(1, 3),
                Call::DeleteShader(3),
            ]
        );
        assert_eq!(driver.live_objects(), vec![program]);
    }

    #[test]
    fn vertex_compile_failure_aborts_before_fragment() {
        let driver = FakeDriver::default();
        let err = build_program(&driver, "BROKEN", FRAG).unwrap_err();

        match &err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("vertex"));
        assert_eq!(driver.count(|c| matches!(c, Call::CreateShader(_, ShaderStage::Fragment))), 0);
        assert_eq!(driver.count(|c| matches!(c, Call::Attach(..) | Call::Link(_))), 0);
        assert!(driver.live_objects().is_empty());
    }

    #[test]
    fn fragment_compile_failure_releases_everything() {
        let driver = FakeDriver::default();
        let err = build_program(&driver, VERT, "void main() { BROKEN }").unwrap_err();

        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
        assert!(err.to_string().contains("fragment"));
        assert_eq!(driver.count(|c| matches!(c, Call::Attach(..) | Call::Link(_))), 0);
        assert!(driver.live_objects().is_empty());
    }

    #[test]
    fn empty_driver_log_is_replaced() {
        let driver = FakeDriver {
            quiet_logs: true,
            ..Default::default()
        };
        match build_program(&driver, "BROKEN", FRAG).unwrap_err() {
            ShaderError::Compile { log, .. } => assert_eq!(log, EMPTY_LOG),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn link_failure_deletes_program_and_shaders() {
        let driver = FakeDriver {
            fail_link: true,
            ..Default::default()
        };
        let err = build_program(&driver, VERT, FRAG).unwrap_err();

        match err {
            ShaderError::Link { log } => assert!(log.contains("not consumed")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(driver.count(|c| matches!(c, Call::DeleteShader(_))), 2);
        assert!(driver.live_objects().is_empty());
    }

    #[test]
    fn loads_from_split_source() {
        let source = ShaderSource::parse(&format!("#shader vertex\n{VERT}#shader fragment\n{FRAG}")).unwrap();
        let driver = FakeDriver::default();
        let program = load_shader_program(&driver, &source).unwrap();
        assert_eq!(driver.live_objects(), vec![program]);
    }
}
