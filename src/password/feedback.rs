use super::strength::{Strength, ValidationResult};

/// Human-readable summary of a validation result.
pub fn password_feedback(result: &ValidationResult) -> Vec<String> {
    let mut lines = Vec::new();

    if result.valid {
        lines.push("✓ Password meets all requirements".to_string());
    } else {
        lines.push("✗ Password does not meet requirements:".to_string());
        lines.extend(result.errors.iter().map(|error| format!("  - {error}")));
    }

    lines.push(format!("Password strength: {}", result.strength));
    lines.push(format!("Score: {}/100", result.score));

    if result.strength < Strength::Strong {
        lines.push("Suggestions:".to_string());
        lines.push("  - Use at least 12 characters".to_string());
        lines.push("  - Mix uppercase, lowercase, numbers, and symbols".to_string());
        lines.push("  - Avoid common words and sequential patterns".to_string());
    }

    lines
}
