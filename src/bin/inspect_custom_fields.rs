//! Utility to inspect the account's custom field definitions.
//!
//! Useful when setting up a new account: shows every definition with its
//! type and scopes, and whether the LinkedIn profile field is ready to use.

use rust_wfm_linkedin::config::Config;
use rust_wfm_linkedin::workflowmax::{WorkflowMaxClient, LINKEDIN_PROFILE_FIELD};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let client = WorkflowMaxClient::new(&config)?;

    let definitions = client.get_definitions().await?;
    println!("Found {} custom field definition(s):", definitions.len());

    for definition in definitions.iter() {
        let mut scopes = Vec::new();
        if definition.use_client {
            scopes.push("client");
        }
        if definition.use_contact {
            scopes.push("contact");
        }
        if definition.use_job {
            scopes.push("job");
        }
        if definition.use_lead {
            scopes.push("lead");
        }

        println!(
            "- {} ({:?}, scopes: {})",
            definition.name,
            definition.field_type,
            if scopes.is_empty() {
                "none".to_string()
            } else {
                scopes.join(", ")
            }
        );
        if !definition.options.is_empty() {
            println!("    options: {}", definition.options.join(", "));
        }
    }

    println!();
    match client.linkedin_field_definition().await {
        Ok(definition) => println!(
            "✓ '{}' field is set up for contacts (type {:?}, UUID {})",
            definition.name, definition.field_type, definition.uuid
        ),
        Err(_) => println!(
            "❌ No contact-scoped '{}' field found. Create a custom field with that name \
             (type Link) and contact scope before running the sync.",
            LINKEDIN_PROFILE_FIELD
        ),
    }

    Ok(())
}
