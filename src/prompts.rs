//! Instruction text sent alongside the packaging photo.
//!
//! The prompt and [`crate::pipeline::validate`] form a matched pair: the
//! prompt names the JSON fields the validator requires. Any schema change must
//! touch both and bump [`PROMPT_VERSION`].
//!
//! Keeping the prompt here as a constant makes it inspectable from unit tests
//! without a live model.

/// Version of the response schema this prompt asks for.
pub const PROMPT_VERSION: u32 = 1;

/// Prompt requesting the device/IMEI JSON object.
pub const SCAN_PROMPT: &str = r#"Analyze this image of device boxes and provide a JSON response with the following structure:

{
  "description": "A brief, clear description of what you see in the image (1-2 sentences)",
  "deviceCount": number of devices in the picture,
  "devices": array of objects, each containing:
    - "position": string describing the device's position in the image
    - "imei": string containing ONE IMEI number for that device
}

If the image is not clear enough for accurate IMEI reading, set deviceCount to 0 and include an 'error' field with the message.

Return ONLY the JSON response with no additional text or markdown formatting."#;

/// Build the prompt for a scan.
pub fn scan_prompt() -> &'static str {
    SCAN_PROMPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_schema_field() {
        for field in ["\"description\"", "\"deviceCount\"", "\"devices\"", "\"position\"", "\"imei\""] {
            assert!(SCAN_PROMPT.contains(field), "prompt is missing {field}");
        }
        assert!(SCAN_PROMPT.contains("'error'"));
    }

    #[test]
    fn prompt_demands_json_only() {
        assert!(scan_prompt().contains("Return ONLY the JSON response"));
    }
}
