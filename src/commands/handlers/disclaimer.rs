//! Medical disclaimer command handler
//!
//! Handles: disclaimer
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::input::CommandInput;
use crate::features::disclaimer::DISCLAIMER_TEXT;

pub struct DisclaimerHandler;

#[async_trait]
impl CommandHandler for DisclaimerHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["disclaimer"]
    }

    fn usage(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("disclaimer", "Read the medical disclaimer"),
            ("disclaimer accept | disclaimer revoke", "Accept or withdraw acceptance"),
        ]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, input: &CommandInput) -> Result<String> {
        match input.args.first().map(|a| a.to_lowercase()).as_deref() {
            Some("accept") => {
                ctx.disclaimer.accept().await?;
                Ok("✅ Thanks! All commands are now available. Type `help` to get started.".to_string())
            }
            Some("revoke") => {
                ctx.disclaimer.revoke().await?;
                Ok("Disclaimer acceptance withdrawn.".to_string())
            }
            _ => {
                let status = match ctx.disclaimer.accepted_at().await {
                    Some(at) if ctx.disclaimer.has_accepted().await => {
                        format!("You accepted this on {}.", at.format("%Y-%m-%d %H:%M"))
                    }
                    _ => "Type `disclaimer accept` to continue.".to_string(),
                };
                Ok(format!("⚕️ **Medical disclaimer**\n\n{DISCLAIMER_TEXT}\n\n{status}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::test_context;

    async fn run(ctx: &Arc<CommandContext>, line: &str) -> Result<String> {
        let input = CommandInput::parse(line)?.unwrap();
        DisclaimerHandler.handle(ctx.clone(), &input).await
    }

    #[tokio::test]
    async fn test_accept_flow() {
        let f = test_context().await;
        assert!(run(&f.ctx, "disclaimer").await.unwrap().contains("disclaimer accept"));

        run(&f.ctx, "disclaimer accept").await.unwrap();
        assert!(f.ctx.disclaimer.has_accepted().await);
        assert!(run(&f.ctx, "disclaimer")
            .await
            .unwrap()
            .contains("You accepted this on 2026-10-19 10:00"));

        run(&f.ctx, "disclaimer revoke").await.unwrap();
        assert!(!f.ctx.disclaimer.has_accepted().await);
    }
}
