use hive_graphql_engine_config::EngineConfig;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(EngineConfig);

    match serde_json::to_string_pretty(&schema) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("Failed to serialize the configuration schema: {}", err);
            std::process::exit(1);
        }
    }
}
