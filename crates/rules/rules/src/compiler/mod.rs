pub mod payload;
pub mod runtime;
pub mod script;

pub use payload::CompiledRule;
pub use runtime::DESCRIPTOR_PATH;
pub use script::{
    CompiledScript, NO_RULES_PLACEHOLDER, ScriptCompiler, extract_payload, is_placeholder,
    render_style, style_declarations,
};
