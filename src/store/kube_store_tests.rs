// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `kube_store.rs`

#[cfg(test)]
mod tests {
    use crate::crd::ServicePlan;
    use crate::store::kube_store::map_kube_error;
    use crate::store::StoreError;

    fn api_error(code: u16, message: &str) -> kube::Error {
        kube::Error::Api(Box::new(kube::core::Status {
            status: None,
            code,
            message: message.to_string(),
            reason: "Test".to_string(),
            metadata: None,
            details: None,
        }))
    }

    #[test]
    fn test_404_maps_to_not_found() {
        let err = map_kube_error::<ServicePlan>(api_error(404, "gone"), "cf", "plan-a");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "ServicePlan cf/plan-a not found");
    }

    #[test]
    fn test_409_maps_to_conflict() {
        let err = map_kube_error::<ServicePlan>(
            api_error(409, "the object has been modified"),
            "cf",
            "plan-a",
        );

        assert!(err.is_conflict());
        assert!(err.to_string().contains("the object has been modified"));
    }

    #[test]
    fn test_other_errors_are_api_errors() {
        let err = map_kube_error::<ServicePlan>(api_error(403, "forbidden"), "cf", "plan-a");

        assert!(matches!(err, StoreError::Api(_)));
        assert!(!err.is_conflict());
        assert!(!err.is_not_found());
    }
}
