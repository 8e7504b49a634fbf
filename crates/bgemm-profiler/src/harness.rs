//! The instance benchmarking loop.
//!
//! For one problem: build and initialise the operands, compute the host
//! reference, then bind, filter, run, score and verify every registered
//! variant in enumeration order. Perf lines go to stdout in the profiler's
//! established format; diagnostics go through `tracing`.

use bgemm_common::{Element, GemmLayouts, HostTensor, OperationSignature};
use bgemm_kernels::{
    get_instances_for, reference_batched_gemm_multiply_multiply, registry, DeviceBatchedGemmMultiD,
    DeviceMem, GemmBuffers, MultiplyMultiply, PassThrough,
};
use tracing::{debug, info, info_span, warn};

use crate::check::{check_err, Tolerance};
use crate::config::ProfileConfig;
use crate::error::{ProfilerError, Result};
use crate::init::initialize;
use crate::report::{BestPerf, Perf, ProfileReport, SessionOutcome, VariantReport};

pub const OPERATION_NAME: &str = "batched_gemm_multiply_multiply";

/// `println!` unless the session is quiet.
macro_rules! emit {
    ($config:expr, $($arg:tt)*) => {
        if !$config.quiet {
            println!($($arg)*);
        }
    };
}

/// Profile every registered instance for the element types `A, B, D0, D1, E`.
pub fn profile_batched_gemm_multiply_multiply<A, B, D0, D1, E>(
    layouts: GemmLayouts,
    config: &ProfileConfig,
) -> Result<ProfileReport>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    if registry().instance_count() == 0 {
        return Err(ProfilerError::EmptyRegistry);
    }
    let instances = get_instances_for::<A, B, D0, D1, E>(layouts);
    profile_instances::<A, B, D0, D1, E>(layouts, config, instances)
}

/// Device-side copies of the operands.
struct DeviceOperands {
    a: DeviceMem,
    b: DeviceMem,
    d0: DeviceMem,
    d1: DeviceMem,
    e: DeviceMem,
}

impl DeviceOperands {
    fn buffers(&self) -> GemmBuffers {
        GemmBuffers {
            a: self.a.device_buffer(),
            b: self.b.device_buffer(),
            ds: [self.d0.device_buffer(), self.d1.device_buffer()],
            e: self.e.device_buffer(),
        }
    }
}

fn upload<T: Element>(tensor: &HostTensor<T>) -> Result<DeviceMem> {
    let mem = DeviceMem::for_elements(tensor.data().len(), T::DATA_TYPE.size_bytes())?;
    mem.to_device(tensor.as_bytes())?;
    Ok(mem)
}

/// `label` followed by the comma-separated storage of `tensor`.
fn log_range<T: Element>(label: &str, tensor: &HostTensor<T>) -> String {
    let values: Vec<String> = tensor.data().iter().map(|v| v.to_f32().to_string()).collect();
    format!("{label}{}", values.join(","))
}

/// Profile an explicit list of instances of the given signature.
pub fn profile_instances<A, B, D0, D1, E>(
    layouts: GemmLayouts,
    config: &ProfileConfig,
    instances: &[Box<dyn DeviceBatchedGemmMultiD>],
) -> Result<ProfileReport>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    let signature = OperationSignature::of::<A, B, D0, D1, E>(layouts);
    let problem = config.problem.resolve(&layouts)?;
    let _span = info_span!(
        "profile",
        %signature,
        m = problem.m,
        n = problem.n,
        k = problem.k,
        batch = problem.batch_count
    )
    .entered();

    let mut a = HostTensor::<A>::zeros(problem.a_desc(&layouts));
    let mut b = HostTensor::<B>::zeros(problem.b_desc(&layouts));
    let mut d0 = HostTensor::<D0>::zeros(problem.d_desc(0, &layouts));
    let mut d1 = HostTensor::<D1>::zeros(problem.d_desc(1, &layouts));
    let mut e_host = HostTensor::<E>::zeros(problem.e_desc(&layouts));
    let mut e_device = HostTensor::<E>::zeros(problem.e_desc(&layouts));

    emit!(config, "a_g_m_k: {}", a.desc());
    emit!(config, "b_g_k_n: {}", b.desc());
    emit!(config, "d0_g_m_n: {}", d0.desc());
    emit!(config, "d1_g_m_n: {}", d1.desc());
    emit!(config, "e_g_m_n: {}", e_host.desc());

    initialize(config.init, config.seed, &mut a, &mut b, &mut d0, &mut d1);
    debug!(init = %config.init, seed = config.seed, "operands initialised");

    let device = DeviceOperands {
        a: upload(&a)?,
        b: upload(&b)?,
        d0: upload(&d0)?,
        d1: upload(&d1)?,
        e: DeviceMem::for_elements(e_device.data().len(), E::DATA_TYPE.size_bytes())?,
    };

    if config.verify {
        reference_batched_gemm_multiply_multiply(&a, &b, &d0, &d1, &mut e_host, MultiplyMultiply)?;
    }

    emit!(config, "found {} instances", instances.len());
    info!(instances = instances.len(), "enumerated instances");

    let stream_config = config.stream_config();
    let sizes = [A::DATA_TYPE.size_bytes(), B::DATA_TYPE.size_bytes(), E::DATA_TYPE.size_bytes()];
    let tolerance = Tolerance::for_type(E::DATA_TYPE);

    let mut best = BestPerf::default();
    let mut pass = true;
    let mut variants = Vec::with_capacity(instances.len());

    for op in instances {
        let name = op.type_string();
        let argument = op.make_argument_pointer(
            device.buffers(),
            &problem,
            PassThrough,
            PassThrough,
            MultiplyMultiply,
        );

        if !op.is_supported_argument(argument.as_ref()) {
            emit!(config, "{name} does not support this problem");
            debug!(instance = %name, "skipped unsupported instance");
            variants.push(VariantReport {
                name,
                supported: false,
                perf: None,
                verification: None,
                error: None,
            });
            continue;
        }

        let invoker = op.make_invoker_pointer();
        // Stale output from an earlier variant must not mask missing writes.
        let launched = device
            .e
            .set_zero()
            .and_then(|()| invoker.run(argument.as_ref(), &stream_config));
        let ave_time = match launched {
            Ok(ave_time) => ave_time,
            Err(e) => {
                emit!(config, "{name} failed to run: {e}");
                warn!(instance = %name, error = %e, "instance launch failed");
                pass = false;
                variants.push(VariantReport {
                    name,
                    supported: true,
                    perf: None,
                    verification: None,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let perf = Perf::score(&problem, sizes, ave_time);
        emit!(config, "Perf: {perf}, {name}");

        let mut report = VariantReport {
            name,
            supported: true,
            perf: Some(perf),
            verification: None,
            error: None,
        };
        if best.update(&report) {
            debug!(instance = %report.name, tflops = perf.tflops, "new best instance");
        }

        if config.verify {
            e_device.copy_from_bytes(&device.e.to_vec()?)?;
            let outcome = check_err(&e_device, &e_host, tolerance);
            pass &= outcome.passed;
            if !outcome.passed {
                warn!(instance = %report.name, mismatches = outcome.mismatches, "output mismatch");
            }

            if config.log {
                emit!(config, "{}", log_range("a : ", &a));
                emit!(config, "{}", log_range("b: ", &b));
                emit!(config, "{}", log_range("c_host: ", &e_host));
                emit!(config, "{}", log_range("c_device: ", &e_device));
            }
            report.verification = Some(outcome);
        }
        variants.push(report);
    }

    emit!(config, "Best Perf: {best}");

    let supported = variants.iter().filter(|v| v.supported).count();
    let outcome = if instances.is_empty() {
        SessionOutcome::NoInstances
    } else if supported == 0 {
        emit!(config, "no instance supports this problem");
        SessionOutcome::NoSupportedInstances
    } else if pass {
        SessionOutcome::Pass
    } else {
        SessionOutcome::Fail
    };
    info!(%outcome, best = %best.name, "profiling finished");

    Ok(ProfileReport {
        operation: OPERATION_NAME.to_string(),
        signature,
        problem,
        instances_found: instances.len(),
        variants,
        best,
        outcome,
    })
}
