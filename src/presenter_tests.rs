// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `presenter.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        InputParameterSchema, ServiceBindingSchema, ServiceInstanceSchema,
        ServicePlanBrokerCatalog, ServicePlanFeatures, ServicePlanSchemas, ServicePlanSpec,
    };
    use crate::presenter::{for_service_plan, for_service_plan_list};
    use crate::repositories::ServicePlanResource;
    use chrono::DateTime;
    use serde_json::json;
    use std::collections::BTreeMap;
    use url::Url;

    fn params(value: serde_json::Value) -> InputParameterSchema {
        InputParameterSchema {
            parameters: Some(value),
        }
    }

    fn record() -> ServicePlanResource {
        ServicePlanResource {
            plan: ServicePlanSpec {
                name: "my-service-plan".to_string(),
                free: true,
                description: "service plan description".to_string(),
                broker_catalog: ServicePlanBrokerCatalog {
                    id: "broker-plan-guid".to_string(),
                    metadata: Some(json!({"foo": "bar"})),
                    features: ServicePlanFeatures {
                        plan_updateable: true,
                        bindable: true,
                    },
                },
                schemas: ServicePlanSchemas {
                    service_instance: ServiceInstanceSchema {
                        create: params(json!({"create-param": "create-value"})),
                        update: params(json!({"update-param": "update-value"})),
                    },
                    service_binding: ServiceBindingSchema {
                        create: params(json!({"binding-create-param": "binding-create-value"})),
                    },
                },
            },
            guid: "resource-guid".to_string(),
            created_at: DateTime::from_timestamp_millis(1000).unwrap(),
            updated_at: DateTime::from_timestamp_millis(2000),
            labels: BTreeMap::from([("label".to_string(), "label-foo".to_string())]),
            annotations: BTreeMap::from([(
                "annotation".to_string(),
                "annotation-bar".to_string(),
            )]),
            service_offering_guid: "service-offering-guid".to_string(),
        }
    }

    fn base() -> Url {
        Url::parse("https://api.example.org").unwrap()
    }

    #[test]
    fn test_plan_document() {
        let output = serde_json::to_value(for_service_plan(&record(), &base())).unwrap();

        assert_eq!(
            output,
            json!({
                "name": "my-service-plan",
                "free": true,
                "description": "service plan description",
                "broker_catalog": {
                    "id": "broker-plan-guid",
                    "metadata": {"foo": "bar"},
                    "features": {
                        "plan_updateable": true,
                        "bindable": true
                    }
                },
                "schemas": {
                    "service_instance": {
                        "create": {"parameters": {"create-param": "create-value"}},
                        "update": {"parameters": {"update-param": "update-value"}}
                    },
                    "service_binding": {
                        "create": {"parameters": {"binding-create-param": "binding-create-value"}}
                    }
                },
                "guid": "resource-guid",
                "created_at": "1970-01-01T00:00:01Z",
                "updated_at": "1970-01-01T00:00:02Z",
                "metadata": {
                    "labels": {"label": "label-foo"},
                    "annotations": {"annotation": "annotation-bar"}
                },
                "relationships": {
                    "service_offering": {"data": {"guid": "service-offering-guid"}}
                },
                "links": {
                    "self": {"href": "https://api.example.org/v3/service_plans/resource-guid"},
                    "service_offering": {
                        "href": "https://api.example.org/v3/service_offerings/service-offering-guid"
                    }
                }
            })
        );
    }

    #[test]
    fn test_unknown_update_time_is_null() {
        let mut plan = record();
        plan.updated_at = None;

        let output = serde_json::to_value(for_service_plan(&plan, &base())).unwrap();

        assert!(output["updated_at"].is_null());
    }

    #[test]
    fn test_missing_metadata_and_parameters() {
        let mut plan = record();
        plan.plan.broker_catalog.metadata = None;
        plan.plan.schemas = ServicePlanSchemas::default();

        let output = serde_json::to_value(for_service_plan(&plan, &base())).unwrap();

        assert!(output["broker_catalog"]["metadata"].is_null());
        assert_eq!(output["schemas"]["service_instance"]["create"], json!({}));
    }

    #[test]
    fn test_links_respect_base_path() {
        let base = Url::parse("https://api.example.org/cf/").unwrap();

        let response = for_service_plan(&record(), &base);

        assert_eq!(
            response.links.self_link.href,
            "https://api.example.org/cf/v3/service_plans/resource-guid"
        );
    }

    #[test]
    fn test_list_envelope() {
        let plans = vec![record(), record()];

        let list = for_service_plan_list(&plans, &base());

        assert_eq!(list.pagination.total_results, 2);
        assert_eq!(list.pagination.total_pages, 1);
        assert_eq!(
            list.pagination.first.href,
            "https://api.example.org/v3/service_plans?page=1"
        );
        assert!(list.pagination.next.is_none());
        assert_eq!(list.resources.len(), 2);
    }
}
