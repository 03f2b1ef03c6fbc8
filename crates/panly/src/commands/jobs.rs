//! commit, log, report and wait.

use panly_api::{CommitRequest, Error, JobCheck, LogQuery, PollSettings, ReportQuery, XapiClient};

use crate::cli::{CommitArgs, GlobalOpts, JobKind, LogArgs, ReportArgs, WaitArgs};

pub async fn commit(client: &mut XapiClient, args: CommitArgs, global: &GlobalOpts) -> Result<(), Error> {
    let request = CommitRequest {
        cmd: args.cmd,
        action: args.action,
        sync: args.sync,
        legacy_poll: args.legacy,
        interval: args.poll.interval,
        timeout: args.poll.job_timeout,
    };
    let job = client.commit(&request).await?;
    if let Some(job) = job {
        if !args.sync && !global.quiet {
            eprintln!("commit job: {job}");
        }
    }
    Ok(())
}

pub async fn log(client: &mut XapiClient, args: LogArgs) -> Result<(), Error> {
    let query = LogQuery {
        log_type: args.log_type,
        nlogs: args.nlogs,
        skip: args.skip,
        filter: args.filter,
        direction: args.dir,
        interval: args.poll.interval,
        timeout: args.poll.job_timeout,
    };
    client.log(&query).await?;
    Ok(())
}

pub async fn report(client: &mut XapiClient, args: ReportArgs) -> Result<(), Error> {
    let query = ReportQuery {
        report_type: args.reporttype,
        report_name: args.reportname,
        vsys: args.vsys,
        cmd: args.cmd,
        extra: args.params,
        interval: args.poll.interval,
        timeout: args.poll.job_timeout,
    };
    client.report(&query).await?;
    Ok(())
}

pub async fn wait(client: &mut XapiClient, args: WaitArgs) -> Result<(), Error> {
    let settings = PollSettings::new(args.poll.interval, args.poll.job_timeout)?;
    let check = match args.kind {
        JobKind::Op => JobCheck::ShowJobs,
        JobKind::Log => JobCheck::action_get("log"),
        JobKind::Report => JobCheck::action_get("report"),
    };
    client.wait_for_job(&args.job_id, &check, settings).await
}
