//! Prompt templates and conversation-turn builders.
//!
//! Templates are static instruction texts rendered through minijinja. Their
//! behavioral contract matters more than their wording: the generation
//! templates ask for a single fenced code block (the implementation template
//! additionally allows a response starting with `Impossible` plus rationale),
//! and the fix templates ask for a corrected single fenced block given the
//! prior code and the verification log.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::conversation::ConversationTurn;

const GENERATE_IMPL_TEMPLATE: &str = include_str!("prompts/generate_impl.md");
const FIX_IMPL_TEMPLATE: &str = include_str!("prompts/fix_impl.md");
const GENERATE_TESTS_TEMPLATE: &str = include_str!("prompts/generate_tests.md");
const FIX_TESTS_TEMPLATE: &str = include_str!("prompts/fix_tests.md");

/// Which artifact kind a cycle is generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Implementation from test code, verified by compile + test.
    Implementation,
    /// Test file from a spec segment, verified by compile only.
    TestCase,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
    framework: String,
}

impl PromptEngine {
    pub fn new(framework: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.add_template("generate_impl", GENERATE_IMPL_TEMPLATE)
            .expect("generate_impl template should be valid");
        env.add_template("fix_impl", FIX_IMPL_TEMPLATE)
            .expect("fix_impl template should be valid");
        env.add_template("generate_tests", GENERATE_TESTS_TEMPLATE)
            .expect("generate_tests template should be valid");
        env.add_template("fix_tests", FIX_TESTS_TEMPLATE)
            .expect("fix_tests template should be valid");
        Self {
            env,
            framework: framework.into(),
        }
    }

    /// Instruction text for the initial generation request.
    pub fn generation_prompt(&self, flow: Flow) -> Result<String> {
        let name = match flow {
            Flow::Implementation => "generate_impl",
            Flow::TestCase => "generate_tests",
        };
        let template = self.env.get_template(name)?;
        let rendered = template.render(context! {
            framework => self.framework.as_str(),
        })?;
        Ok(rendered)
    }

    /// Instruction text for a fix request.
    ///
    /// Assumes a known target: unlike the generation prompt it never asks the
    /// model whether the task is possible.
    pub fn fix_prompt(&self, flow: Flow) -> Result<String> {
        let name = match flow {
            Flow::Implementation => "fix_impl",
            Flow::TestCase => "fix_tests",
        };
        let template = self.env.get_template(name)?;
        let rendered = template.render(context! {})?;
        Ok(rendered)
    }
}

/// Initial request: instruction template plus the caller-supplied input.
pub fn generation_turns(prompt: &str, input: &str) -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::user(prompt),
        ConversationTurn::user(input),
    ]
}

/// Fix request: full transcript replay followed by the fix-specific turns.
pub fn fix_turns(
    transcript: &str,
    prompt: &str,
    verification_log: &str,
    code: &str,
) -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::assistant(transcript),
        ConversationTurn::user(prompt),
        ConversationTurn::user(verification_log),
        ConversationTurn::user(code),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;

    #[test]
    fn implementation_prompt_offers_the_impossible_escape() {
        let engine = PromptEngine::new("jest");
        let prompt = engine.generation_prompt(Flow::Implementation).expect("render");
        assert!(prompt.contains("Impossible"));
        assert!(prompt.contains("```"));
    }

    #[test]
    fn test_case_prompt_names_the_configured_framework() {
        let engine = PromptEngine::new("vitest");
        let prompt = engine.generation_prompt(Flow::TestCase).expect("render");
        assert!(prompt.contains("vitest"));
        assert!(prompt.contains("import"));
    }

    #[test]
    fn fix_prompts_do_not_reopen_the_possibility_question() {
        let engine = PromptEngine::new("jest");
        for flow in [Flow::Implementation, Flow::TestCase] {
            let prompt = engine.fix_prompt(flow).expect("render");
            assert!(!prompt.contains("Impossible"));
        }
    }

    #[test]
    fn generation_turns_are_two_user_messages() {
        let turns = generation_turns("instructions", "test code");
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().all(|t| t.role == Role::User));
        assert_eq!(turns[1].text, "test code");
    }

    #[test]
    fn fix_turns_replay_the_transcript_first() {
        let turns = fix_turns("prior transcript", "fix it", "error log", "old code");
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(turns[0].text, "prior transcript");
        assert_eq!(
            [&turns[1].text, &turns[2].text, &turns[3].text],
            [&"fix it".to_string(), &"error log".to_string(), &"old code".to_string()]
        );
    }
}
