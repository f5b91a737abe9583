//! Structured tool descriptions with usage guidance.
//!
//! `ToolSpec` replaces free-form description strings with structured
//! metadata: purpose, when to use, when not to use, parameters, examples, and
//! disambiguation against similar tools. Twenty-odd filesystem tools overlap
//! heavily (`find_by_extension` vs `find_by_type`, `move_file` vs
//! `rename_file`), so the `when_not_to_use` and `disambiguate` fields carry
//! most of the weight.

use crate::ToolDef;

#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name (must be unique within a ToolSet).
    pub name: String,
    /// One-sentence imperative purpose.
    pub purpose: String,
    pub when_to_use: String,
    /// When this tool should NOT be used (prevents confusion with similar tools).
    pub when_not_to_use: String,
    /// JSON Schema of the arguments.
    pub parameters: serde_json::Value,
    pub examples: Vec<UsageExample>,
    pub output_format: String,
    pub disambiguation: Vec<DisambiguationExample>,
}

/// An example clarifying when to use this tool vs a similar one.
#[derive(Debug, Clone)]
pub struct DisambiguationExample {
    pub scenario: String,
    pub correct_tool: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct UsageExample {
    pub input: String,
    pub output: String,
}

impl ToolSpec {
    /// Start a spec. Every tool needs at least a name and a purpose; the
    /// remaining sections are optional and omitted from the description when
    /// empty.
    pub fn builder(name: impl Into<String>, purpose: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder {
            spec: ToolSpec {
                name: name.into(),
                purpose: purpose.into(),
                when_to_use: String::new(),
                when_not_to_use: String::new(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
                examples: Vec::new(),
                output_format: "JSON".into(),
                disambiguation: Vec::new(),
            },
        }
    }

    /// Render the structured fields as one description string.
    pub fn to_description(&self) -> String {
        let mut desc = format!("{}.", self.purpose);
        if !self.when_to_use.is_empty() {
            desc.push_str(&format!("\nWhen to use: {}", self.when_to_use));
        }
        if !self.when_not_to_use.is_empty() {
            desc.push_str(&format!("\nWhen NOT to use: {}", self.when_not_to_use));
        }

        if !self.examples.is_empty() {
            desc.push_str("\nExamples:");
            for ex in &self.examples {
                desc.push_str(&format!("\n  - Input: {} -> {}", ex.input, ex.output));
            }
        }

        if !self.output_format.is_empty() {
            desc.push_str(&format!("\nOutput format: {}", self.output_format));
        }

        if !self.disambiguation.is_empty() {
            desc.push_str("\nDisambiguation:");
            for d in &self.disambiguation {
                desc.push_str(&format!(
                    "\n  - {}: use '{}' instead ({})",
                    d.scenario, d.correct_tool, d.reason
                ));
            }
        }

        desc
    }

    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.name.clone(),
            self.to_description(),
            self.parameters.clone(),
        )
    }
}

pub struct ToolSpecBuilder {
    spec: ToolSpec,
}

impl ToolSpecBuilder {
    pub fn when_to_use(mut self, when: impl Into<String>) -> Self {
        self.spec.when_to_use = when.into();
        self
    }

    pub fn when_not_to_use(mut self, when_not: impl Into<String>) -> Self {
        self.spec.when_not_to_use = when_not.into();
        self
    }

    pub fn parameters(mut self, params: serde_json::Value) -> Self {
        self.spec.parameters = params;
        self
    }

    /// Derive the parameter schema from the typed argument struct, so the
    /// schema and deserialization can never diverge.
    pub fn parameters_for<T: schemars::JsonSchema>(self) -> Self {
        self.parameters(crate::json_schema_for::<T>())
    }

    pub fn example(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.spec.examples.push(UsageExample {
            input: input.into(),
            output: output.into(),
        });
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.spec.output_format = format.into();
        self
    }

    pub fn disambiguate(
        mut self,
        scenario: impl Into<String>,
        correct_tool: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.spec.disambiguation.push(DisambiguationExample {
            scenario: scenario.into(),
            correct_tool: correct_tool.into(),
            reason: reason.into(),
        });
        self
    }

    /// Shortcut for `.build().to_tool_def()`.
    pub fn to_tool_def(self) -> ToolDef {
        self.build().to_tool_def()
    }

    pub fn build(self) -> ToolSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tool_spec() {
        let spec = ToolSpec::builder("find_by_extension", "Find files with one extension")
            .when_to_use("When you know the exact extension")
            .when_not_to_use("For several extensions at once, use find_by_type")
            .parameters(serde_json::json!({
                "type": "object",
                "properties": { "ext": { "type": "string" } },
                "required": ["ext"]
            }))
            .example("find_by_extension(ext='pdf')", "All .pdf files")
            .build();

        assert_eq!(spec.name, "find_by_extension");
        let desc = spec.to_description();
        assert!(desc.starts_with("Find files with one extension."));
        assert!(desc.contains("When NOT to use:"));
        assert!(desc.contains("find_by_type"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let desc = ToolSpec::builder("index_status", "Report index state")
            .build()
            .to_description();
        assert!(!desc.contains("When to use"));
        assert!(!desc.contains("Examples"));
        assert!(desc.contains("Output format: JSON"));
    }

    #[test]
    fn builder_to_tool_def_shortcut() {
        let def = ToolSpec::builder("move_file", "Move a file")
            .disambiguate(
                "Only the name changes",
                "rename_file",
                "rename_file keeps the parent folder",
            )
            .to_tool_def();

        assert_eq!(def.function.name, "move_file");
        assert!(def.function.description.contains("use 'rename_file' instead"));
        assert_eq!(def.function.parameters["type"], "object");
    }
}
