//! Schema CLI command

use prereq::{CurriculumDocument, EngineConfig, Result};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum SchemaKind {
    #[default]
    Curriculum,
    Config,
}

#[derive(clap::Parser, Debug)]
pub struct Schema {
    #[clap(value_enum, default_value_t)]
    kind: SchemaKind,
}

impl Schema {
    pub fn run(self) -> Result<()> {
        let schema = match self.kind {
            SchemaKind::Curriculum => schemars::schema_for!(CurriculumDocument),
            SchemaKind::Config => schemars::schema_for!(EngineConfig),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
