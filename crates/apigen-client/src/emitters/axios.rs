use apigen_core::config::TargetConfig;
use apigen_core::error::GeneratorError;
use apigen_core::ir::OperationRecord;
use minijinja::context;

use super::render;
use super::view::OperationView;

/// Render the request function of one operation. The text is the same for both axios
/// styles; only where it is exported from differs.
pub fn render_operation(
    record: &OperationRecord,
    config: &TargetConfig,
) -> Result<String, GeneratorError> {
    let op = OperationView::new(record, config);
    let (tdata, callee) = match &op.mutator {
        Some(mutator) => (op.success_type.clone(), format!("{mutator}<TData>")),
        None => (
            format!("AxiosResponse<{}>", op.success_type),
            "axios.request".to_string(),
        ),
    };
    render(
        "axios.ts.j2",
        context! {
            tdata => tdata,
            callee => callee,
            signature => op.signature("AxiosRequestConfig"),
            headers_expr => op.headers_expr(false),
            op => op,
        },
    )
}

/// Declarations emitted after the unit body: parameter types plus the `XResult` alias.
///
/// `factory` is the name of the factory function when operations live inside one.
pub fn render_deferred(
    record: &OperationRecord,
    config: &TargetConfig,
    factory: Option<&str>,
) -> String {
    let op = OperationView::new(record, config);
    let result = match factory {
        Some(factory) => format!(
            "export type {}Result = NonNullable<Awaited<ReturnType<ReturnType<typeof {factory}>['{}']>>>;",
            op.pascal, op.name
        ),
        None if op.mutator.is_some() => format!(
            "export type {}Result = NonNullable<Awaited<ReturnType<typeof {}>>>;",
            op.pascal, op.name
        ),
        None => format!(
            "export type {}Result = AxiosResponse<{}>;",
            op.pascal, op.success_type
        ),
    };
    let mut parts = op.declarations;
    parts.push(result);
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::view::tests::{SPEC, record};

    #[test]
    fn test_operation_uses_request_config() {
        let config = TargetConfig::default();
        let out = render_operation(&record(SPEC, &config), &config).unwrap();
        insta::assert_snapshot!(out, @r"
        /**
         * Replace a pet
         * @deprecated
         */
        const updatePet = <TData = AxiosResponse<Pet>>(storeId: string, petId: number, body: Pet, params?: UpdatePetParams, headers?: UpdatePetHeaders, options?: AxiosRequestConfig): Promise<TData> => {
          const formUrlEncoded = new URLSearchParams();
          Object.entries(body ?? {}).forEach(([key, value]) => {
            if (value !== undefined) {
              formUrlEncoded.append(key, String(value));
            }
          });

          const normalizedParams = new URLSearchParams();
          const explodeParameters = ['tags'];
          Object.entries(params || {}).forEach(([key, value]) => {
            if (value === undefined) {
              return;
            }
            if (Array.isArray(value) && explodeParameters.includes(key)) {
              value.forEach((v) => normalizedParams.append(key, v === null ? 'null' : String(v)));
              return;
            }
            normalizedParams.append(key, value === null ? 'null' : String(value));
          });

          return axios.request({
            ...options,
            url: `/stores/${storeId}/pets/${petId}`,
            method: 'PUT',
            headers: { 'Content-Type': 'application/x-www-form-urlencoded', ...headers, ...options?.headers },
            params: normalizedParams,
            data: formUrlEncoded,
          });
        };
        ");
    }

    #[test]
    fn test_deferred_aliases() {
        let config = TargetConfig::default();
        let rec = record(SPEC, &config);
        let factory = render_deferred(&rec, &config, Some("getPetstore"));
        assert!(factory.starts_with("export type UpdatePetParams = {"));
        assert!(factory.ends_with(
            "export type UpdatePetResult = NonNullable<Awaited<ReturnType<ReturnType<typeof getPetstore>['updatePet']>>>;"
        ));
        let flat = render_deferred(&rec, &config, None);
        assert!(flat.ends_with("export type UpdatePetResult = AxiosResponse<Pet>;"));
    }

    #[test]
    fn test_params_serializer_is_passed_through() {
        let config = TargetConfig {
            params_serializer: Some(apigen_core::config::MutatorConfig {
                path: "./serializer".to_string(),
                name: "serialize".to_string(),
                default: false,
            }),
            ..TargetConfig::default()
        };
        let out = render_operation(&record(SPEC, &config), &config).unwrap();
        assert!(out.contains("    params,\n    paramsSerializer: serialize,\n"));
        assert!(!out.contains("normalizedParams"));
    }
}
