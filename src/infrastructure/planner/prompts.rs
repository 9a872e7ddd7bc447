//! Prompt assembly for the planning, reevaluation and composition calls
//!
//! Prompts carry the capability manifest and the structured history so the
//! model always decides against the full workflow state. Output shapes are
//! stated inline; parsing is strict on the Rust side.

use crate::domain::{
    AgentDescriptor, StepResult, TerminationReason, TurnRole, WorkflowContext,
};

pub fn planner_system_prompt(agents: &[AgentDescriptor]) -> String {
    let mut prompt = String::from(
        "You are the planning core of a personal assistant. Decide the single \
         next atomic action toward fulfilling the user's request, or report \
         completion.\n\nAvailable agents:\n",
    );

    for agent in agents {
        prompt.push_str(&format!("- {}: {}\n", agent.name, agent.description));

        if !agent.operations.is_empty() {
            let ops: Vec<String> = agent
                .operations
                .iter()
                .map(|op| {
                    if op.requires_confirmation {
                        format!("{} (needs user confirmation)", op.name)
                    } else {
                        op.name.clone()
                    }
                })
                .collect();
            prompt.push_str(&format!("  operations: {}\n", ops.join(", ")));
        }

        if !agent.example_phrases.is_empty() {
            prompt.push_str(&format!(
                "  handles requests like: {}\n",
                agent.example_phrases.join("; ")
            ));
        }
    }

    prompt.push_str(
        "\nRules:\n\
         - Plan exactly one step at a time.\n\
         - Only use agents from the list above.\n\
         - Recipients must be concrete email addresses; resolve a person's \
           name through the contacts agent before any step that needs their \
           address.\n\
         - Reuse values already present in the gathered data instead of \
           looking them up again.\n\n\
         Respond with JSON only:\n\
         {\"action\": \"next_step\", \"step\": {\"agent\": \"...\", \
         \"operation\": \"...\", \"parameters\": {}, \"description\": \"...\"}}\n\
         or\n\
         {\"action\": \"complete\"}\n",
    );

    prompt
}

pub fn planner_user_prompt(context: &WorkflowContext) -> String {
    let mut prompt = format!("User request: {}\n", context.original_request());

    if !context.conversation().is_empty() {
        prompt.push_str("\nRecent conversation:\n");
        for turn in context.conversation() {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            };
            prompt.push_str(&format!("{}: {}\n", role, turn.text));
        }
    }

    if !context.completed_steps().is_empty() {
        prompt.push_str("\nSteps executed so far:\n");
        for record in context.completed_steps() {
            let outcome = match &record.result {
                Some(result) if result.success => format!("ok - {}", result.summary),
                Some(result) => format!(
                    "failed - {}",
                    result.error.as_deref().unwrap_or("unknown error")
                ),
                None => "pending".to_string(),
            };
            prompt.push_str(&format!(
                "{}. [{}] {} ({})\n",
                record.step_number, record.agent, record.description, outcome
            ));
        }
    }

    if !context.gathered_data().is_empty() {
        prompt.push_str(&format!(
            "\nGathered data:\n{}\n",
            serde_json::to_string_pretty(context.gathered_data()).unwrap_or_default()
        ));
    }

    if let Some(plan) = context.plan() {
        if !plan.is_empty() {
            prompt.push_str("\nCurrent advisory plan (may be revised):\n");
            for step in plan.steps() {
                prompt.push_str(&format!("- [{}] {}\n", step.agent, step.description));
            }
        }
    }

    prompt.push_str(&format!(
        "\nStep budget: {} of {} used.\nDecide the next step or complete.",
        context.current_step(),
        context.max_steps()
    ));

    prompt
}

pub fn reevaluator_system_prompt() -> String {
    "You review the latest executed action of a personal assistant and decide \
     how to proceed.\n\n\
     Respond with JSON only:\n\
     {\"outcome\": \"continue\"}\n\
     or {\"outcome\": \"replan\", \"plan\": [{\"agent\": \"...\", \
     \"description\": \"...\"}]}\n\
     or {\"outcome\": \"terminate\", \"message\": \"...\"}\n\n\
     Guidance:\n\
     - continue: the result is usable and the request is not finished.\n\
     - replan: the result invalidates the remaining plan (for example a \
       search found nothing, so dependent steps must change).\n\
     - terminate: the request is finished or cannot be finished; the message \
       explains the state in user-facing language.\n"
        .to_string()
}

pub fn reevaluator_user_prompt(context: &WorkflowContext, latest: &StepResult) -> String {
    let latest_line = if latest.success {
        format!("succeeded: {}", latest.summary)
    } else {
        format!(
            "failed: {} ({})",
            latest.summary,
            latest.error.as_deref().unwrap_or("unknown error")
        )
    };

    format!(
        "User request: {}\n\nLatest step {}\n\nSteps executed: {} of {}\n\n\
         Gathered data:\n{}\n\nDecide: continue, replan or terminate.",
        context.original_request(),
        latest_line,
        context.current_step(),
        context.max_steps(),
        serde_json::to_string_pretty(context.gathered_data()).unwrap_or_default()
    )
}

pub fn composer_system_prompt() -> String {
    "You write the final reply of a personal assistant. Summarize what was \
     done for the user in warm, plain language. Skip technical details: no \
     identifiers, tokens, URLs or internal names. Mention every action taken \
     and anything that failed.\n"
        .to_string()
}

pub fn composer_user_prompt(context: &WorkflowContext, reason: &TerminationReason) -> String {
    let mut prompt = format!("Original request: {}\n", context.original_request());

    prompt.push_str("\nActions taken:\n");
    for record in context.completed_steps() {
        if let Some(result) = &record.result {
            let status = if result.success { "done" } else { "failed" };
            prompt.push_str(&format!("- [{}] {}\n", status, result.summary));
        }
    }

    match reason {
        TerminationReason::Completed => {
            prompt.push_str("\nAll planned work finished. Write the reply.");
        }
        TerminationReason::StepLimitReached => {
            prompt.push_str(
                "\nThe step limit was reached before everything finished. \
                 Say clearly that you got partway and describe what was \
                 completed. Write the reply.",
            );
        }
        TerminationReason::Terminated { message } => {
            prompt.push_str(&format!(
                "\nWork stopped early: {}\nExplain this to the user. Write the reply.",
                message
            ));
        }
    }

    prompt
}
