//! ARN formatting/parsing for the two resource kinds this platform knows
//! about (spec §6.6). Kept deliberately narrow: we only need to round-trip
//! the fixed prefixes used in notification configs and invocation paths.

const LAMBDA_PREFIX: &str = "arn:aws:lambda:function:";
const S3_PREFIX: &str = "arn:aws:s3:::";

pub fn lambda_arn(function_name: &str) -> String {
    format!("{LAMBDA_PREFIX}{function_name}")
}

pub fn s3_arn(bucket: &str) -> String {
    format!("{S3_PREFIX}{bucket}")
}

/// Reverses [`lambda_arn`]. Returns `None` if `arn` doesn't carry the fixed
/// lambda prefix.
pub fn parse_lambda_arn(arn: &str) -> Option<&str> {
    arn.strip_prefix(LAMBDA_PREFIX).filter(|s| !s.is_empty())
}

pub fn parse_s3_arn(arn: &str) -> Option<&str> {
    arn.strip_prefix(S3_PREFIX).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lambda_arn_round_trips() {
        let arn = lambda_arn("echo");
        assert_eq!(arn, "arn:aws:lambda:function:echo");
        assert_eq!(parse_lambda_arn(&arn), Some("echo"));
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert_eq!(parse_lambda_arn("arn:aws:s3:::bucket"), None);
        assert_eq!(parse_s3_arn("arn:aws:lambda:function:echo"), None);
    }
}
