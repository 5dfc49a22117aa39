// ABOUTME: Encoding of the execute-plan request sent to the controller.
// ABOUTME: The request is a tag pair followed by the marshalled plan record.

use bytes::Bytes;
use std::io::Read;

use crate::plan::DeploymentPlan;

use super::codec::{Marshaller, Unmarshaller, WireReader, WireWriter};
use super::error::ProtocolError;
use super::tags::Tag;

/// Encode `plan` as an execute request.
pub fn encode_execute_request(plan: &DeploymentPlan) -> Result<Bytes, ProtocolError> {
    let mut writer = WireWriter::new();
    writer.write_tag(Tag::ExecuteDeploymentPlanRequest);
    writer.write_tag(Tag::ParamDeploymentPlan);
    writer.write_record(plan)?;
    tracing::trace!(plan = %plan.id(), bytes = writer.len(), "encoded execute request");
    Ok(writer.into_bytes())
}

/// Decode an execute request. Content streams are never part of the request.
pub fn read_execute_request(input: impl Read) -> Result<DeploymentPlan, ProtocolError> {
    let mut reader = WireReader::new(input);
    reader.expect_tag(Tag::ExecuteDeploymentPlanRequest)?;
    reader.expect_tag(Tag::ParamDeploymentPlan)?;
    reader.read_record()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DigestDistributor;
    use crate::plan::PlanBuilder;
    use std::io::Cursor;
    use std::sync::Arc;

    #[test]
    fn request_preserves_plan_and_action_ids() {
        let plan = PlanBuilder::new(Arc::new(DigestDistributor))
            .add("app", "app.war", Cursor::new(b"war".to_vec()))
            .unwrap()
            .and_deploy()
            .unwrap()
            .to_server_group("main-group")
            .unwrap()
            .build();

        let bytes = encode_execute_request(&plan).unwrap();
        assert_eq!(bytes[0], Tag::ExecuteDeploymentPlanRequest.as_u8());
        assert_eq!(bytes[1], Tag::ParamDeploymentPlan.as_u8());

        let decoded = read_execute_request(Cursor::new(bytes)).unwrap();
        assert_eq!(decoded.id(), plan.id());
        assert_eq!(decoded.set_plans(), plan.set_plans());
        assert!(decoded.attached_content().is_empty());
    }

    #[test]
    fn request_without_param_tag_is_rejected() {
        let bytes = vec![Tag::ExecuteDeploymentPlanRequest.as_u8(), Tag::PlanId.as_u8()];
        let err = read_execute_request(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedTag { found: Tag::PlanId, .. }));
    }

    #[test]
    fn request_with_invalid_set_is_rejected() {
        let plan = PlanBuilder::new(Arc::new(DigestDistributor))
            .deploy("app.war")
            .unwrap()
            .to_server_group("main-group")
            .unwrap()
            .build();
        let mut record = serde_json::to_value(&plan).unwrap();
        record["set_plans"][0]["graceful_shutdown_millis"] = serde_json::json!(-42);

        let mut writer = WireWriter::new();
        writer.write_tag(Tag::ExecuteDeploymentPlanRequest);
        writer.write_tag(Tag::ParamDeploymentPlan);
        writer.write_record(&record).unwrap();

        let err = read_execute_request(Cursor::new(writer.into_bytes())).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { what: "record", .. }));
    }
}
