use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// Get the path to the prompts directory
fn prompts_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("prompts")
}

pub fn render_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

pub fn render_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    // bare file names resolve against the bundled prompts directory
    let file_path = if !template_path.exists() {
        prompts_dir().join(template_path)
    } else {
        template_path
    };

    let template_content = fs::read_to_string(file_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    render_prompt(&template_content, context_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_render_prompt() {
        let template = "Hello, {{ name }}! You have {{ count }} tools.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "wren".to_string());
        context.insert("count".to_string(), 9.to_string());

        let result = render_prompt(template, &context).unwrap();
        assert_eq!(result, "Hello, wren! You have 9 tools.");
    }

    #[test]
    fn test_render_prompt_missing_variable() {
        let template = "Hello, {{ name }}!";
        let context: HashMap<String, String> = HashMap::new();
        assert!(render_prompt(template, &context).is_err());
    }

    #[test]
    fn test_render_prompt_file() {
        let template_content = "Tools:\n{{ manifest }}";
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("template.md");
        fs::write(&file_path, template_content).unwrap();

        let mut context = HashMap::new();
        context.insert("manifest".to_string(), "Tool: bash".to_string());

        let result = render_prompt_file(file_path, &context).unwrap();
        assert_eq!(result, "Tools:\nTool: bash");
    }

    #[test]
    fn test_bundled_system_template_renders() {
        let mut context = HashMap::new();
        context.insert("manifest".to_string(), "Tool: bash\n".to_string());

        let result = render_prompt_file("system.md", &context).unwrap();
        assert!(result.contains("TOOL:"));
        assert!(result.contains("Tool: bash"));
    }
}
