use crate::contract::ContractError;

const LAMBDA_ARN_PREFIX: &str = "arn:aws:lambda:";
const STACK_ARN_PREFIX: &str = "arn:aws:cloudformation:";

/// A Lambda function ARN, optionally qualified with a version or alias.
///
/// Grammar: `arn:aws:lambda:<region>:<account>:function:<name>[:<qualifier>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaArn {
    pub arn: String,
    pub region: String,
    pub account: String,
    pub name: String,
    pub version: Option<String>,
}

impl LambdaArn {
    pub fn parse(arn: &str) -> Result<Self, ContractError> {
        let invalid = || ContractError::InvalidLambdaArn(arn.to_string());

        let rest = arn.strip_prefix(LAMBDA_ARN_PREFIX).ok_or_else(invalid)?;
        let parts: Vec<&str> = rest.split(':').collect();
        let (region, account, kind, name, version) = match parts.as_slice() {
            [region, account, kind, name] => (*region, *account, *kind, *name, None),
            [region, account, kind, name, version] if !version.is_empty() => {
                (*region, *account, *kind, *name, Some((*version).to_string()))
            }
            _ => return Err(invalid()),
        };

        if kind != "function" || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            arn: arn.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

/// A CloudFormation stack ARN as found in `StackId`.
///
/// Grammar: `arn:aws:cloudformation:<region>:<account>:stack/<name>/<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackArn {
    pub arn: String,
    pub region: String,
    pub account: String,
    pub name: String,
    pub id: String,
}

impl StackArn {
    pub fn parse(arn: &str) -> Result<Self, ContractError> {
        let invalid = || ContractError::InvalidStackArn(arn.to_string());

        let rest = arn.strip_prefix(STACK_ARN_PREFIX).ok_or_else(invalid)?;
        let marker = rest.rfind(":stack/").ok_or_else(invalid)?;
        let (scope, resource) = (&rest[..marker], &rest[marker + ":stack/".len()..]);

        let (region, account) = scope.rsplit_once(':').ok_or_else(invalid)?;
        let (name, id) = resource.rsplit_once('/').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            arn: arn.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            name: name.to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unqualified_function_arn() {
        let arn = LambdaArn::parse("arn:aws:lambda:us-east-1:123:function:foo")
            .expect("arn should parse");

        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account, "123");
        assert_eq!(arn.name, "foo");
        assert_eq!(arn.version, None);
    }

    #[test]
    fn parses_version_qualifier() {
        let arn = LambdaArn::parse("arn:aws:lambda:eu-west-1:123456789012:function:edge-auth:7")
            .expect("arn should parse");

        assert_eq!(arn.name, "edge-auth");
        assert_eq!(arn.version.as_deref(), Some("7"));
    }

    #[test]
    fn rejects_malformed_function_arns() {
        for candidate in [
            "",
            "foo",
            "arn:aws:lambda:us-east-1:123:layer:foo",
            "arn:aws:lambda:us-east-1:123:function:",
            "arn:aws:lambda:us-east-1:123:function:foo:",
            "arn:aws:lambda:us-east-1:123:function:foo:1:extra",
            "arn:aws:s3:::bucket",
        ] {
            let error = LambdaArn::parse(candidate).expect_err("arn should be rejected");
            assert!(matches!(error, ContractError::InvalidLambdaArn(_)), "{candidate}");
        }
    }

    #[test]
    fn invalid_function_arn_message_names_the_parameter() {
        let error = LambdaArn::parse("not-an-arn").expect_err("arn should be rejected");
        assert_eq!(
            error.to_string(),
            "Parameter LambdaSourceArn \"not-an-arn\" must be a valid Lambda ARN"
        );
    }

    #[test]
    fn parses_stack_arn() {
        let arn = StackArn::parse(
            "arn:aws:cloudformation:us-east-1:123456789012:stack/website/2f7f3a10-0b1c-11ef-9f1a-0a1b2c3d4e5f",
        )
        .expect("stack arn should parse");

        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account, "123456789012");
        assert_eq!(arn.name, "website");
        assert_eq!(arn.id, "2f7f3a10-0b1c-11ef-9f1a-0a1b2c3d4e5f");
    }

    #[test]
    fn rejects_malformed_stack_arns() {
        for candidate in [
            "",
            "arn:aws:cloudformation:us-east-1:123:stack/no-id",
            "arn:aws:cloudformation:us-east-1:stack/name/id",
            "arn:aws:lambda:us-east-1:123:function:foo",
        ] {
            assert!(StackArn::parse(candidate).is_err(), "{candidate}");
        }
    }
}
