use arx_core::domain::Stance;

fn stance_instruction(stance: Stance) -> &'static str {
    match stance {
        Stance::Pro => "supporting and advocating for",
        Stance::Con => "opposing and arguing against",
    }
}

pub fn stance_prompt(topic: &str, stance: Stance, source_blocks: &str, max_words: usize) -> String {
    let instruction = stance_instruction(stance);
    let label = stance.as_str();
    format!(
        r#"You are an expert argumentative writer who creates well-reasoned, evidence-based arguments.

Based on the following sources, write a compelling argument {instruction} the topic: "{topic}"

Sources:
{source_blocks}

Instructions:
1. Create a logical, well-structured argument that takes a clear {label} stance
2. Use evidence from the provided sources to support your points
3. Include specific references to sources (e.g., "According to Source 1...")
4. Make the argument persuasive but factual
5. Keep the argument under {max_words} words
6. Structure with clear reasoning and evidence

Argument:
"#
    )
}

pub fn evaluation_prompt(content: &str, citations: &[String]) -> String {
    let joined = citations.join("; ");
    format!(
        r#"You are an expert argument evaluator.

Evaluate the following argument on a scale of 0.0 to 1.0 for each criterion:

Argument: {content}

Citations: {joined}

Please rate:
1. Clarity (0.0-1.0): How clear and understandable is the argument?
2. Logic (0.0-1.0): How logical and well-structured is the reasoning?
3. Evidence (0.0-1.0): How well does it use evidence and citations?
4. Persuasiveness (0.0-1.0): How convincing is the argument?

Provide feedback in this format:
Clarity: X.X
Logic: X.X
Evidence: X.X
Persuasiveness: X.X
Feedback: [Brief explanation of strengths and weaknesses]
"#
    )
}
